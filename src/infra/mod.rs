pub mod console;
pub mod grid;
pub mod sqlite;
