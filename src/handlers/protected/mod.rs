// handlers/protected/mod.rs - Bearer-authenticated handlers
//
// Every route here sits behind middleware::require_principal, which places
// the caller's Principal in the request extensions.

pub mod clients;
pub mod contracts;
pub mod events;
pub mod me;

pub use me::me_get;
