// Visit analytics for the owner dashboard.
// Visits in the window are loaded once and summarised in memory; summaries are cached in Redis.

pub mod aggregate;
pub mod cache;
pub mod handlers;
