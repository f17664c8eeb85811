pub mod grid;
pub mod notify;
pub mod repo;
