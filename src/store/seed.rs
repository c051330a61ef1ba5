//! Startup provisioning of principals from a JSON file.
//!
//! ```json
//! [
//!   { "username": "sales1", "password": "vente1111", "team": "sales" },
//!   { "username": "manager", "password": "manage1111" }
//! ]
//! ```
//!
//! Usernames that already exist are left untouched, so seeding the same file
//! into a persistent store twice is harmless.

use serde::Deserialize;
use thiserror::Error;

use super::{Store, StoreError};
use crate::auth::{hash_password, PasswordError};
use crate::database::models::NewUser;
use crate::identity::{Team, UnknownTeam};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Seed entry '{username}': {source}")]
    Team {
        username: String,
        #[source]
        source: UnknownTeam,
    },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub team: Option<String>,
}

impl SeedUser {
    fn team(&self) -> Result<Option<Team>, SeedError> {
        match self.team.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name.parse().map(Some).map_err(|source| SeedError::Team {
                username: self.username.clone(),
                source,
            }),
        }
    }
}

pub fn parse_seed(json: &str) -> Result<Vec<SeedUser>, SeedError> {
    Ok(serde_json::from_str(json)?)
}

/// Inserts every seed user not already present. Returns how many were created.
pub async fn seed_users(store: &dyn Store, users: &[SeedUser]) -> Result<usize, SeedError> {
    let mut created = 0;
    for seed in users {
        let team = seed.team()?;
        if store.user_by_username(&seed.username).await?.is_some() {
            tracing::debug!(username = %seed.username, "seed user exists, skipped");
            continue;
        }
        let user = store
            .insert_user(NewUser {
                username: seed.username.clone(),
                password_hash: hash_password(&seed.password)?,
                team,
            })
            .await?;
        tracing::info!(user = user.id, username = %user.username, "seeded user");
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::store::MemoryStore;

    const SEED: &str = r#"[
        { "username": "sales1", "password": "vente1111", "team": "sales" },
        { "username": "support1", "password": "help1111", "team": "Support" },
        { "username": "manager", "password": "manage1111" }
    ]"#;

    #[tokio::test]
    async fn seeds_users_once() {
        let store = MemoryStore::new();
        let users = parse_seed(SEED).unwrap();

        assert_eq!(seed_users(&store, &users).await.unwrap(), 3);
        assert_eq!(seed_users(&store, &users).await.unwrap(), 0);

        let sales = store.user_by_username("sales1").await.unwrap().unwrap();
        assert_eq!(sales.team(), Some(Team::Sales));
        assert!(verify_password("vente1111", &sales.password_hash).unwrap());

        let manager = store.user_by_username("manager").await.unwrap().unwrap();
        assert_eq!(manager.team(), None);
    }

    #[tokio::test]
    async fn unknown_team_is_rejected() {
        let store = MemoryStore::new();
        let users = parse_seed(r#"[{ "username": "x", "password": "y", "team": "admin" }]"#).unwrap();

        assert!(matches!(seed_users(&store, &users).await, Err(SeedError::Team { .. })));
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn development_seed_file_covers_both_teams() {
        let users = parse_seed(include_str!("../../dev/users.json")).unwrap();
        let store = MemoryStore::new();
        seed_users(&store, &users).await.unwrap();

        let teams: Vec<_> = store.list_users().await.unwrap().iter().map(|u| u.team()).collect();
        assert!(teams.contains(&Some(Team::Sales)));
        assert!(teams.contains(&Some(Team::Support)));
        assert!(teams.contains(&None));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(parse_seed("{"), Err(SeedError::Parse(_))));
    }
}
