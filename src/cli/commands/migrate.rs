use crate::cli::utils::{open_database, output_success};
use crate::cli::OutputFormat;
use crate::database::migrations::SCHEMA;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let db = open_database().await?;
    db.migrate().await?;
    db.close().await;

    let applied: Vec<&str> = SCHEMA.iter().map(|(name, _)| *name).collect();
    output_success(
        output_format,
        &format!("Schema up to date ({} statements)", applied.len()),
        Some(serde_json::json!({ "applied": applied })),
    )
}
