pub mod documents;
pub mod handlers;
