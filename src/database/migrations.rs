use sqlx::PgPool;
use tracing::info;

use super::DatabaseError;

/// Ordered, idempotent schema statements.
pub const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(150) NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            team VARCHAR(16) CHECK (team IN ('Sales', 'Support'))
        )"#,
    ),
    (
        "clients",
        r#"CREATE TABLE IF NOT EXISTS clients (
            id BIGSERIAL PRIMARY KEY,
            first_name VARCHAR(25) NOT NULL,
            last_name VARCHAR(25) NOT NULL,
            email VARCHAR(100) NOT NULL,
            phone VARCHAR(20) NOT NULL,
            mobile VARCHAR(20) NOT NULL,
            company_name VARCHAR(250) NOT NULL,
            date_created DATE NOT NULL DEFAULT CURRENT_DATE,
            date_updated DATE NOT NULL DEFAULT CURRENT_DATE,
            sales_contact BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE
        )"#,
    ),
    (
        "contracts",
        r#"CREATE TABLE IF NOT EXISTS contracts (
            id BIGSERIAL PRIMARY KEY,
            sales_contact BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            client_id BIGINT NOT NULL REFERENCES clients (id) ON DELETE CASCADE,
            date_created DATE NOT NULL DEFAULT CURRENT_DATE,
            date_updated DATE NOT NULL DEFAULT CURRENT_DATE,
            signed_status BOOLEAN NOT NULL DEFAULT FALSE,
            amount DOUBLE PRECISION NOT NULL,
            payment_due DATE NOT NULL
        )"#,
    ),
    (
        "event_statuses",
        r#"CREATE TABLE IF NOT EXISTS event_statuses (
            id BIGSERIAL PRIMARY KEY,
            status BOOLEAN NOT NULL DEFAULT FALSE UNIQUE
        )"#,
    ),
    (
        "events",
        r#"CREATE TABLE IF NOT EXISTS events (
            id BIGSERIAL PRIMARY KEY,
            client_id BIGINT NOT NULL REFERENCES clients (id) ON DELETE CASCADE,
            date_created DATE NOT NULL DEFAULT CURRENT_DATE,
            date_updated DATE NOT NULL DEFAULT CURRENT_DATE,
            support_contact BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            event_status_id BIGINT NOT NULL REFERENCES event_statuses (id) ON DELETE CASCADE,
            attendees INTEGER NOT NULL,
            event_date DATE NOT NULL,
            notes VARCHAR(400) NOT NULL DEFAULT ''
        )"#,
    ),
    (
        "events_support_contact_idx",
        "CREATE INDEX IF NOT EXISTS events_support_contact_idx ON events (support_contact)",
    ),
    (
        "clients_sales_contact_idx",
        "CREATE INDEX IF NOT EXISTS clients_sales_contact_idx ON clients (sales_contact)",
    ),
];

/// Applies the schema inside one transaction.
pub async fn apply(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for (name, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::MigrationError(format!("{}: {}", name, e)))?;
        info!("Applied schema step: {}", name);
    }
    tx.commit().await?;
    Ok(())
}
