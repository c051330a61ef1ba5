use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::{open_store, output_success};
use crate::cli::OutputFormat;
use crate::database::models::NewUser;
use crate::identity::Team;
use crate::store::seed::{parse_seed, seed_users};
use crate::store::Store;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a principal")]
    Add {
        #[arg(help = "Login name")]
        username: String,

        #[arg(long, help = "Initial password")]
        password: String,

        #[arg(long, help = "Team membership: sales or support")]
        team: Option<Team>,
    },

    #[command(about = "List principals")]
    List,

    #[command(about = "Create principals from a JSON seed file, skipping existing usernames")]
    Seed {
        #[arg(help = "Path to the seed file")]
        file: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store().await?;

    match cmd {
        UserCommands::Add {
            username,
            password,
            team,
        } => {
            let user = store
                .insert_user(NewUser {
                    username,
                    password_hash: hash_password(&password)?,
                    team,
                })
                .await?;
            tracing::info!(user = user.id, "user created");

            output_success(
                output_format,
                &format!("Created user '{}' (id {})", user.username, user.id),
                Some(json!({ "id": user.id, "username": user.username, "team": user.team_name })),
            )
        }
        UserCommands::Seed { file } => {
            let json = std::fs::read_to_string(&file)?;
            let users = parse_seed(&json)?;
            let created = seed_users(&store, &users).await?;
            output_success(
                output_format,
                &format!("Created {} of {} users from {}", created, users.len(), file),
                Some(json!({ "created": created, "total": users.len() })),
            )
        }
        UserCommands::List => {
            let users = store.list_users().await?;
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    if users.is_empty() {
                        println!("No users");
                    }
                    for user in users {
                        println!(
                            "{:>4}  {:<20} {}",
                            user.id,
                            user.username,
                            user.team_name.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
