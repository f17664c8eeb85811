pub mod address;
pub mod edit;
pub mod schema;
pub mod table;
pub mod value;
