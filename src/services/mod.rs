//! Request workflows. Each create runs grant check, field stamping,
//! validation and persistence in that order; each update runs grant check,
//! lookup, ownership check, stamping, validation and persistence. A denial
//! stops the workflow before anything is validated or written.

pub mod auth;
pub mod clients;
pub mod contracts;
pub mod events;
pub mod validate;

pub use auth::AuthService;
pub use clients::ClientService;
pub use contracts::ContractService;
pub use events::EventService;

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::authz::Denial;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Not found.")]
    NotFound,

    #[error(transparent)]
    Denied(#[from] Denial),

    #[error("Invalid payload")]
    Validation { field_errors: HashMap<String, String> },

    /// Login failures, reported as 400 with the given text.
    #[error("{0}")]
    Credentials(&'static str),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
