use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{ClientLinks, Store, StoreError};
use crate::authz::has_active_contract;
use crate::database::models::{
    Client, Contract, Event, EventStatus, NewClient, NewContract, NewEvent, NewUser, User,
};
use crate::identity::UserId;
use crate::scope::{ClientFilter, ClientScope, ContractFilter, ContractScope, EventFilter, EventScope};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    clients: BTreeMap<i64, Client>,
    contracts: BTreeMap<i64, Contract>,
    events: BTreeMap<i64, Event>,
    statuses: BTreeMap<i64, EventStatus>,
}

fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

impl Tables {
    fn client_visible(&self, scope: ClientScope, client: &Client) -> bool {
        scope.admits(client, self.events.values())
    }

    fn event_visible(&self, scope: EventScope, event: &Event) -> bool {
        self.clients
            .get(&event.client)
            .map_or(false, |client| scope.admits(event, client))
    }

    fn require_client(&self, id: i64) -> Result<(), StoreError> {
        if self.clients.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("client {} does not exist", id)))
        }
    }

    fn require_user(&self, id: UserId) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("user {} does not exist", id)))
        }
    }

    fn require_status(&self, id: i64) -> Result<(), StoreError> {
        if self.statuses.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("event status {} does not exist", id)))
        }
    }
}

/// Process-local store. Every call takes the lock once, so each operation
/// sees a consistent snapshot and concurrent writes are last-write-wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}' is taken", user.username)));
        }
        let row = User {
            id: next_id(&tables.users),
            username: user.username,
            password_hash: user.password_hash,
            team_name: user.team.map(|t| t.as_str().to_string()),
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn list_clients(&self, scope: ClientScope, filter: &ClientFilter) -> Result<Vec<Client>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .values()
            .filter(|c| tables.client_visible(scope, c) && filter.matches(c))
            .cloned()
            .collect())
    }

    async fn find_client(&self, scope: ClientScope, id: i64) -> Result<Option<Client>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .get(&id)
            .filter(|c| tables.client_visible(scope, c))
            .cloned())
    }

    async fn client(&self, id: i64) -> Result<Option<Client>, StoreError> {
        Ok(self.tables.read().await.clients.get(&id).cloned())
    }

    async fn client_links(&self, id: i64) -> Result<ClientLinks, StoreError> {
        let tables = self.tables.read().await;
        Ok(ClientLinks {
            events: tables.events.values().filter(|e| e.client == id).map(|e| e.id).collect(),
            contracts: tables.contracts.values().filter(|c| c.client == id).map(|c| c.id).collect(),
        })
    }

    async fn insert_client(&self, client: NewClient) -> Result<Client, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_user(client.sales_contact)?;
        let fields = client.fields;
        let row = Client {
            id: next_id(&tables.clients),
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            mobile: fields.mobile,
            company_name: fields.company_name,
            date_created: client.today,
            date_updated: client.today,
            sales_contact: client.sales_contact,
        };
        tables.clients.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_client(&self, client: &Client) -> Result<Client, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_user(client.sales_contact)?;
        match tables.clients.get_mut(&client.id) {
            Some(row) => {
                *row = client.clone();
                Ok(row.clone())
            }
            None => Err(StoreError::Missing { entity: "client", id: client.id }),
        }
    }

    async fn list_contracts(
        &self,
        scope: ContractScope,
        filter: &ContractFilter,
    ) -> Result<Vec<Contract>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .contracts
            .values()
            .filter(|k| scope.admits(k))
            .filter(|k| {
                tables
                    .clients
                    .get(&k.client)
                    .map_or(false, |client| filter.matches(k, client))
            })
            .cloned()
            .collect())
    }

    async fn find_contract(&self, scope: ContractScope, id: i64) -> Result<Option<Contract>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.contracts.get(&id).filter(|k| scope.admits(k)).cloned())
    }

    async fn contract(&self, id: i64) -> Result<Option<Contract>, StoreError> {
        Ok(self.tables.read().await.contracts.get(&id).cloned())
    }

    async fn insert_contract(&self, contract: NewContract) -> Result<Contract, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_client(contract.fields.client)?;
        tables.require_user(contract.sales_contact)?;
        let fields = contract.fields;
        let row = Contract {
            id: next_id(&tables.contracts),
            sales_contact: contract.sales_contact,
            client: fields.client,
            date_created: contract.today,
            date_updated: contract.today,
            signed_status: fields.signed_status,
            amount: fields.amount,
            payment_due: fields.payment_due,
        };
        tables.contracts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_contract(&self, contract: &Contract) -> Result<Contract, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_client(contract.client)?;
        tables.require_user(contract.sales_contact)?;
        match tables.contracts.get_mut(&contract.id) {
            Some(row) => {
                *row = contract.clone();
                Ok(row.clone())
            }
            None => Err(StoreError::Missing { entity: "contract", id: contract.id }),
        }
    }

    async fn has_active_contract(&self, client_id: i64) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(match tables.clients.get(&client_id) {
            Some(client) => has_active_contract(client, tables.contracts.values()),
            None => false,
        })
    }

    async fn list_events(&self, scope: EventScope, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .values()
            .filter(|e| {
                tables
                    .clients
                    .get(&e.client)
                    .map_or(false, |client| scope.admits(e, client) && filter.matches(e, client))
            })
            .cloned()
            .collect())
    }

    async fn find_event(&self, scope: EventScope, id: i64) -> Result<Option<Event>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .get(&id)
            .filter(|e| tables.event_visible(scope, e))
            .cloned())
    }

    async fn event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_client(event.fields.client)?;
        tables.require_user(event.fields.support_contact)?;
        tables.require_status(event.event_status)?;
        let fields = event.fields;
        let row = Event {
            id: next_id(&tables.events),
            client: fields.client,
            date_created: event.today,
            date_updated: event.today,
            support_contact: fields.support_contact,
            event_status: event.event_status,
            attendees: fields.attendees,
            event_date: fields.event_date,
            notes: fields.notes,
        };
        tables.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_event(&self, event: &Event) -> Result<Event, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_client(event.client)?;
        tables.require_user(event.support_contact)?;
        tables.require_status(event.event_status)?;
        match tables.events.get_mut(&event.id) {
            Some(row) => {
                *row = event.clone();
                Ok(row.clone())
            }
            None => Err(StoreError::Missing { entity: "event", id: event.id }),
        }
    }

    async fn default_event_status(&self) -> Result<EventStatus, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(status) = tables.statuses.values().find(|s| !s.status) {
            return Ok(*status);
        }
        let status = EventStatus {
            id: next_id(&tables.statuses),
            status: false,
        };
        tables.statuses.insert(status.id, status);
        Ok(status)
    }

    async fn event_status(&self, id: i64) -> Result<Option<EventStatus>, StoreError> {
        Ok(self.tables.read().await.statuses.get(&id).copied())
    }
}
