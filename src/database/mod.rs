pub mod manager;
pub mod migrations;
pub mod models;
pub mod query;

pub use manager::{DatabaseError, DatabaseManager};
