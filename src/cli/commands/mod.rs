pub mod grants;
pub mod migrate;
pub mod user;
