pub mod client;
pub mod contract;
pub mod event;
pub mod user;

pub use client::{Client, ClientDetail, ClientFields, NewClient};
pub use contract::{Contract, ContractFields, NewContract};
pub use event::{Event, EventFields, EventStatus, NewEvent};
pub use user::{NewUser, User};
