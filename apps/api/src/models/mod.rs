pub mod application;
pub mod company;
pub mod visit;
