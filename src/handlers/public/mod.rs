// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service descriptor, health probe and token acquisition.

pub mod auth;
pub mod root;

pub use auth::{login_post, refresh_post};
pub use root::{health_get, root_get};
