use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::{Team, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored team name; anything unrecognised is treated as no team.
    #[sqlx(rename = "team")]
    pub team_name: Option<String>,
}

impl User {
    pub fn team(&self) -> Option<Team> {
        self.team_name.as_deref().and_then(|name| name.parse().ok())
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub team: Option<Team>,
}
