use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::DatabaseManager;
use crate::store::PgStore;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Administrative commands always talk to PostgreSQL; the in-memory store
/// lives only inside a server process.
pub async fn open_database() -> anyhow::Result<DatabaseManager> {
    let db = DatabaseManager::connect(&config().database).await?;
    Ok(db)
}

pub async fn open_store() -> anyhow::Result<PgStore> {
    Ok(PgStore::new(open_database().await?))
}
