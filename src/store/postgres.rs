use async_trait::async_trait;
use sqlx::Row;

use super::{ClientLinks, Store, StoreError};
use crate::database::models::{
    Client, Contract, Event, EventStatus, NewClient, NewContract, NewEvent, NewUser, User,
};
use crate::database::query::{Condition, Select, SortDirection};
use crate::database::DatabaseManager;
use crate::identity::UserId;
use crate::scope::{ClientFilter, ClientScope, ContractFilter, ContractScope, EventFilter, EventScope};

fn client_scope(scope: ClientScope) -> Option<Condition> {
    match scope {
        ClientScope::All => None,
        ClientScope::OwnedBy(user) => Some(Condition::eq("sales_contact", user)),
        ClientScope::SupportedBy(user) => Some(Condition::in_select(
            "id",
            "events",
            "client_id",
            Condition::eq("support_contact", user),
        )),
    }
}

fn contract_scope(scope: ContractScope) -> Option<Condition> {
    match scope {
        ContractScope::All => None,
        ContractScope::OwnedBy(user) => Some(Condition::eq("sales_contact", user)),
    }
}

fn event_scope(scope: EventScope) -> Option<Condition> {
    match scope {
        EventScope::All => None,
        EventScope::ClientOwnedBy(user) => Some(Condition::in_select(
            "client_id",
            "clients",
            "id",
            Condition::eq("sales_contact", user),
        )),
        EventScope::SupportedBy(user) => Some(Condition::eq("support_contact", user)),
    }
}

/// Conditions on a related client row, reached through `column`.
fn via_client(column: &'static str, inner: Condition) -> Condition {
    Condition::in_select(column, "clients", "id", inner)
}

fn clients_query(scope: ClientScope, filter: &ClientFilter) -> Select {
    Select::from("clients")
        .filter_opt(client_scope(scope))
        .filter_opt(filter.last_name().map(|v| Condition::eq("last_name", v)))
        .filter_opt(filter.email().map(|v| Condition::eq("email", v)))
        .order_by("id", SortDirection::Asc)
}

fn contracts_query(scope: ContractScope, filter: &ContractFilter) -> Select {
    Select::from("contracts")
        .filter_opt(contract_scope(scope))
        .filter_opt(
            filter
                .last_name()
                .map(|v| via_client("client_id", Condition::contains("last_name", v))),
        )
        .filter_opt(
            filter
                .email()
                .map(|v| via_client("client_id", Condition::contains("email", v))),
        )
        .filter_opt(filter.date_created.map(|d| Condition::eq("date_created", d)))
        .filter_opt(filter.amount.map(|a| Condition::eq("amount", a)))
        .filter_opt(filter.client.map(|id| Condition::eq("client_id", id)))
        .order_by("id", SortDirection::Asc)
}

fn events_query(scope: EventScope, filter: &EventFilter) -> Select {
    Select::from("events")
        .filter_opt(event_scope(scope))
        .filter_opt(filter.event_date.map(|d| Condition::eq("event_date", d)))
        .filter_opt(
            filter
                .last_name()
                .map(|v| via_client("client_id", Condition::eq("last_name", v))),
        )
        .filter_opt(
            filter
                .email()
                .map(|v| via_client("client_id", Condition::eq("email", v))),
        )
        .order_by("id", SortDirection::Asc)
}

/// PostgreSQL-backed store. Scopes and filters are pushed down into the
/// WHERE clause.
pub struct PgStore {
    db: DatabaseManager,
}

impl PgStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(self.db.health_check().await?)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(Select::from("users")
            .filter(Condition::eq("username", username))
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(Select::from("users")
            .filter(Condition::eq("id", id))
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, team) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.team.map(|t| t.as_str()))
        .fetch_one(self.db.pool())
        .await?;
        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(Select::from("users")
            .order_by("id", SortDirection::Asc)
            .fetch_all(self.db.pool())
            .await?)
    }

    async fn list_clients(&self, scope: ClientScope, filter: &ClientFilter) -> Result<Vec<Client>, StoreError> {
        Ok(clients_query(scope, filter).fetch_all(self.db.pool()).await?)
    }

    async fn find_client(&self, scope: ClientScope, id: i64) -> Result<Option<Client>, StoreError> {
        Ok(Select::from("clients")
            .filter(Condition::eq("id", id))
            .filter_opt(client_scope(scope))
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn client(&self, id: i64) -> Result<Option<Client>, StoreError> {
        self.find_client(ClientScope::All, id).await
    }

    async fn client_links(&self, id: i64) -> Result<ClientLinks, StoreError> {
        let pool = self.db.pool();
        let ids = |table: &str| format!("SELECT id FROM {} WHERE client_id = $1 ORDER BY id", table);

        let events = sqlx::query(&ids("events"))
            .bind(id)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let contracts = sqlx::query(&ids("contracts"))
            .bind(id)
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ClientLinks { events, contracts })
    }

    async fn insert_client(&self, client: NewClient) -> Result<Client, StoreError> {
        let f = client.fields;
        let row = sqlx::query_as::<_, Client>(
            r#"INSERT INTO clients
                (first_name, last_name, email, phone, mobile, company_name, date_created, date_updated, sales_contact)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
               RETURNING *"#,
        )
        .bind(&f.first_name)
        .bind(&f.last_name)
        .bind(&f.email)
        .bind(&f.phone)
        .bind(&f.mobile)
        .bind(&f.company_name)
        .bind(client.today)
        .bind(client.sales_contact)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row)
    }

    async fn save_client(&self, client: &Client) -> Result<Client, StoreError> {
        let row = sqlx::query_as::<_, Client>(
            r#"UPDATE clients SET
                first_name = $2, last_name = $3, email = $4, phone = $5, mobile = $6,
                company_name = $7, date_updated = $8, sales_contact = $9
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(client.id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.mobile)
        .bind(&client.company_name)
        .bind(client.date_updated)
        .bind(client.sales_contact)
        .fetch_optional(self.db.pool())
        .await?;
        row.ok_or(StoreError::Missing {
            entity: "client",
            id: client.id,
        })
    }

    async fn list_contracts(
        &self,
        scope: ContractScope,
        filter: &ContractFilter,
    ) -> Result<Vec<Contract>, StoreError> {
        Ok(contracts_query(scope, filter).fetch_all(self.db.pool()).await?)
    }

    async fn find_contract(&self, scope: ContractScope, id: i64) -> Result<Option<Contract>, StoreError> {
        Ok(Select::from("contracts")
            .filter(Condition::eq("id", id))
            .filter_opt(contract_scope(scope))
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn contract(&self, id: i64) -> Result<Option<Contract>, StoreError> {
        self.find_contract(ContractScope::All, id).await
    }

    async fn insert_contract(&self, contract: NewContract) -> Result<Contract, StoreError> {
        let f = contract.fields;
        let row = sqlx::query_as::<_, Contract>(
            r#"INSERT INTO contracts
                (sales_contact, client_id, date_created, date_updated, signed_status, amount, payment_due)
               VALUES ($1, $2, $3, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(contract.sales_contact)
        .bind(f.client)
        .bind(contract.today)
        .bind(f.signed_status)
        .bind(f.amount)
        .bind(f.payment_due)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row)
    }

    async fn save_contract(&self, contract: &Contract) -> Result<Contract, StoreError> {
        let row = sqlx::query_as::<_, Contract>(
            r#"UPDATE contracts SET
                sales_contact = $2, client_id = $3, date_updated = $4,
                signed_status = $5, amount = $6, payment_due = $7
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(contract.id)
        .bind(contract.sales_contact)
        .bind(contract.client)
        .bind(contract.date_updated)
        .bind(contract.signed_status)
        .bind(contract.amount)
        .bind(contract.payment_due)
        .fetch_optional(self.db.pool())
        .await?;
        row.ok_or(StoreError::Missing {
            entity: "contract",
            id: contract.id,
        })
    }

    async fn has_active_contract(&self, client_id: i64) -> Result<bool, StoreError> {
        Ok(Select::from("contracts")
            .filter(Condition::eq("client_id", client_id))
            .filter(Condition::eq("signed_status", true))
            .exists(self.db.pool())
            .await?)
    }

    async fn list_events(&self, scope: EventScope, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        Ok(events_query(scope, filter).fetch_all(self.db.pool()).await?)
    }

    async fn find_event(&self, scope: EventScope, id: i64) -> Result<Option<Event>, StoreError> {
        Ok(Select::from("events")
            .filter(Condition::eq("id", id))
            .filter_opt(event_scope(scope))
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn event(&self, id: i64) -> Result<Option<Event>, StoreError> {
        self.find_event(EventScope::All, id).await
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let f = event.fields;
        let row = sqlx::query_as::<_, Event>(
            r#"INSERT INTO events
                (client_id, date_created, date_updated, support_contact, event_status_id, attendees, event_date, notes)
               VALUES ($1, $2, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(f.client)
        .bind(event.today)
        .bind(f.support_contact)
        .bind(event.event_status)
        .bind(f.attendees)
        .bind(f.event_date)
        .bind(&f.notes)
        .fetch_one(self.db.pool())
        .await?;
        Ok(row)
    }

    async fn save_event(&self, event: &Event) -> Result<Event, StoreError> {
        let row = sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                client_id = $2, date_updated = $3, support_contact = $4,
                event_status_id = $5, attendees = $6, event_date = $7, notes = $8
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(event.id)
        .bind(event.client)
        .bind(event.date_updated)
        .bind(event.support_contact)
        .bind(event.event_status)
        .bind(event.attendees)
        .bind(event.event_date)
        .bind(&event.notes)
        .fetch_optional(self.db.pool())
        .await?;
        row.ok_or(StoreError::Missing {
            entity: "event",
            id: event.id,
        })
    }

    async fn default_event_status(&self) -> Result<EventStatus, StoreError> {
        let pool = self.db.pool();
        sqlx::query("INSERT INTO event_statuses (status) VALUES (FALSE) ON CONFLICT (status) DO NOTHING")
            .execute(pool)
            .await?;
        Ok(Select::from("event_statuses")
            .filter(Condition::eq("status", false))
            .fetch_optional(pool)
            .await?
            .ok_or(StoreError::Missing {
                entity: "event status",
                id: 0,
            })?)
    }

    async fn event_status(&self, id: i64) -> Result<Option<EventStatus>, StoreError> {
        Ok(Select::from("event_statuses")
            .filter(Condition::eq("id", id))
            .fetch_optional(self.db.pool())
            .await?)
    }
}
