// Visit tracking for public application pages.
// A visit is created on page load, then patched by heartbeats and a final beacon.

pub mod classify;
pub mod engagement;
pub mod handlers;
