//! Principals, teams and the coarse type-level grants each team carries.
//!
//! Grants are resolved through a static [`GrantTable`] rather than any
//! per-user permission registry, so every decision the authorization engine
//! makes depends only on the principal it is handed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::database::models::User;

pub type UserId = i64;

/// The two fixed teams a principal may belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Team {
    Sales,
    Support,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Sales => "Sales",
            Team::Support => "Support",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown team: {0}")]
pub struct UnknownTeam(pub String);

impl FromStr for Team {
    type Err = UnknownTeam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sales" => Ok(Team::Sales),
            "support" => Ok(Team::Support),
            _ => Err(UnknownTeam(s.to_string())),
        }
    }
}

/// Coarse permission to perform an action on an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    AddClient,
    ChangeClient,
    ViewClient,
    AddContract,
    ChangeContract,
    ViewContract,
    AddEvent,
    ChangeEvent,
    ViewEvent,
}

impl Grant {
    pub fn name(&self) -> &'static str {
        match self {
            Grant::AddClient => "add_client",
            Grant::ChangeClient => "change_client",
            Grant::ViewClient => "view_client",
            Grant::AddContract => "add_contract",
            Grant::ChangeContract => "change_contract",
            Grant::ViewContract => "view_contract",
            Grant::AddEvent => "add_event",
            Grant::ChangeEvent => "change_event",
            Grant::ViewEvent => "view_event",
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The authenticated identity every authorization and scoping call receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub team: Option<Team>,
}

impl Principal {
    pub fn new(id: UserId, username: impl Into<String>, team: Option<Team>) -> Self {
        Self {
            id,
            username: username.into(),
            team,
        }
    }

    pub fn is_in_team(&self, team: Team) -> bool {
        self.team == Some(team)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            team: user.team(),
        }
    }
}

/// Team name to grant set, fixed at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantTable {
    teams: BTreeMap<Team, BTreeSet<Grant>>,
}

impl GrantTable {
    pub fn empty() -> Self {
        Self {
            teams: BTreeMap::new(),
        }
    }

    pub fn with_team(mut self, team: Team, grants: impl IntoIterator<Item = Grant>) -> Self {
        self.teams.entry(team).or_default().extend(grants);
        self
    }

    /// Principals without a team hold no grants.
    pub fn has_grant(&self, principal: &Principal, grant: Grant) -> bool {
        principal
            .team
            .and_then(|team| self.teams.get(&team))
            .map(|grants| grants.contains(&grant))
            .unwrap_or(false)
    }

    pub fn grants_for(&self, team: Option<Team>) -> Vec<Grant> {
        team.and_then(|team| self.teams.get(&team))
            .map(|grants| grants.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn teams(&self) -> impl Iterator<Item = (Team, &BTreeSet<Grant>)> {
        self.teams.iter().map(|(team, grants)| (*team, grants))
    }
}

impl Default for GrantTable {
    /// Sales manages the whole pipeline; Support reads everything and may
    /// only change events.
    fn default() -> Self {
        use Grant::*;

        Self::empty()
            .with_team(
                Team::Sales,
                [AddClient, ChangeClient, AddContract, ChangeContract, AddEvent, ChangeEvent],
            )
            .with_team(Team::Support, [ViewClient, ViewContract, ViewEvent, ChangeEvent])
    }
}
