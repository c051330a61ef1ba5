//! Entity store: create/read/update/filter over users, clients, contracts
//! and events. Scoped reads take the visibility scope computed by
//! [`crate::scope`] so that out-of-scope rows are never returned.

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::database::models::{
    Client, Contract, Event, EventStatus, NewClient, NewContract, NewEvent, NewUser, User,
};
use crate::database::DatabaseError;
use crate::identity::UserId;
use crate::scope::{ClientFilter, ClientScope, ContractFilter, ContractScope, EventFilter, EventScope};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::Constraint(db.message().to_string());
            }
        }
        StoreError::Database(DatabaseError::Sqlx(err))
    }
}

/// Ids of the records linked to one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientLinks {
    pub events: Vec<i64>,
    pub contracts: Vec<i64>,
}

/// Lists are ordered by id ascending. `find_*` methods apply the scope before
/// the lookup; the unscoped getters exist for writes, which look records up
/// by id and then run ownership checks.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn list_clients(&self, scope: ClientScope, filter: &ClientFilter) -> Result<Vec<Client>, StoreError>;
    async fn find_client(&self, scope: ClientScope, id: i64) -> Result<Option<Client>, StoreError>;
    async fn client(&self, id: i64) -> Result<Option<Client>, StoreError>;
    async fn client_links(&self, id: i64) -> Result<ClientLinks, StoreError>;
    async fn insert_client(&self, client: NewClient) -> Result<Client, StoreError>;
    async fn save_client(&self, client: &Client) -> Result<Client, StoreError>;

    async fn list_contracts(
        &self,
        scope: ContractScope,
        filter: &ContractFilter,
    ) -> Result<Vec<Contract>, StoreError>;
    async fn find_contract(&self, scope: ContractScope, id: i64) -> Result<Option<Contract>, StoreError>;
    async fn contract(&self, id: i64) -> Result<Option<Contract>, StoreError>;
    async fn insert_contract(&self, contract: NewContract) -> Result<Contract, StoreError>;
    async fn save_contract(&self, contract: &Contract) -> Result<Contract, StoreError>;
    /// Whether any contract of the client is signed.
    async fn has_active_contract(&self, client_id: i64) -> Result<bool, StoreError>;

    async fn list_events(&self, scope: EventScope, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;
    async fn find_event(&self, scope: EventScope, id: i64) -> Result<Option<Event>, StoreError>;
    async fn event(&self, id: i64) -> Result<Option<Event>, StoreError>;
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError>;
    async fn save_event(&self, event: &Event) -> Result<Event, StoreError>;

    /// The `status = false` row, created on first use.
    async fn default_event_status(&self) -> Result<EventStatus, StoreError>;
    async fn event_status(&self, id: i64) -> Result<Option<EventStatus>, StoreError>;
}
