pub mod application;
pub mod research;
