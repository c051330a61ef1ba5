use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::identity::GrantTable;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let table = GrantTable::default();

    match output_format {
        OutputFormat::Json => {
            let teams: Map<String, Value> = table
                .teams()
                .map(|(team, grants)| {
                    let names: Vec<&str> = grants.iter().map(|g| g.name()).collect();
                    (team.to_string(), json!(names))
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "teams": teams }))?);
        }
        OutputFormat::Text => {
            for (team, grants) in table.teams() {
                println!("{}:", team);
                for grant in grants {
                    println!("  {}", grant.name());
                }
            }
        }
    }
    Ok(())
}
