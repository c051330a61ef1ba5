//! Authorization engine.
//!
//! Two layers compose for every write:
//!
//! 1. a coarse **grant** check (does the principal's team carry the grant for
//!    this action on this entity kind at all?), and
//! 2. for updates, an object-level **ownership** check against the concrete
//!    record, selected per entity kind by a closed match over [`Target`].
//!
//! Checks run in that fixed order and the first failure decides the reported
//! status and message. Reads never reach this module: records outside a
//! principal's scope are filtered out by [`crate::scope`] and surface as
//! not-found.

use serde::Serialize;
use std::fmt;

use crate::database::models::{Client, Contract, Event};
use crate::identity::{Grant, GrantTable, Principal, Team};

pub mod messages {
    pub const NOT_ALLOWED: &str = "You are not allowed.";
    pub const NOT_A_SALES_MEMBER: &str = "You are not allowed because you are not a sales member.";
    pub const CONTRACT_SALES_ONLY: &str =
        "You are not allowed. Only members of sales team can create a contract.";
    pub const EVENT_SALES_ONLY: &str =
        "You are not allowed. Only members of sales team can create an event.";
    pub const NOT_SALES_CONTACT: &str =
        "You're not allowed because you're not the sales contact of the client.";
    pub const NOT_SUPPORT_CONTACT: &str = "You're not allowed because you're not the support contact.";
    pub const NOT_EVENT_CONTACT: &str =
        "You're not allowed because you're neither the sales contact nor the support contact.";
    pub const NO_SIGNED_CONTRACT: &str =
        "You're not allowed because the client has no signed contract.";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Client,
    Contract,
    Event,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Contract => "contract",
            EntityKind::Event => "event",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    GrantDenied,
    OwnershipDenied,
    PreconditionFailed,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::GrantDenied => "GRANT_DENIED",
            DenialReason::OwnershipDenied => "OWNERSHIP_DENIED",
            DenialReason::PreconditionFailed => "PRECONDITION_FAILED",
        }
    }
}

/// A terminal refusal: the reason, the HTTP status it surfaces as and the
/// message shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    pub status: u16,
    pub message: &'static str,
}

impl Denial {
    const fn grant(status: u16, message: &'static str) -> Self {
        Self {
            reason: DenialReason::GrantDenied,
            status,
            message,
        }
    }

    const fn ownership(message: &'static str) -> Self {
        Self {
            reason: DenialReason::OwnershipDenied,
            status: 403,
            message,
        }
    }

    const fn precondition(message: &'static str) -> Self {
        Self {
            reason: DenialReason::PreconditionFailed,
            status: 403,
            message,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.reason.code(), self.status, self.message)
    }
}

impl std::error::Error for Denial {}

pub type Decision = Result<(), Denial>;

/// Named relationship between a principal and a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Client and contract: their own `sales_contact`. Event: its client's.
    SalesContact,
    /// Event: its `support_contact`. Nothing else has one.
    SupportContact,
}

/// A concrete record an ownership predicate is evaluated against. Events
/// carry their client because sales ownership flows through it.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Client(&'a Client),
    Contract(&'a Contract),
    Event { event: &'a Event, client: &'a Client },
}

impl Target<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Target::Client(_) => EntityKind::Client,
            Target::Contract(_) => EntityKind::Contract,
            Target::Event { .. } => EntityKind::Event,
        }
    }
}

impl Ownership {
    pub fn holds(&self, principal: &Principal, target: &Target<'_>) -> bool {
        match (self, target) {
            (Ownership::SalesContact, Target::Client(client)) => client.sales_contact == principal.id,
            (Ownership::SalesContact, Target::Contract(contract)) => {
                contract.sales_contact == principal.id
            }
            (Ownership::SalesContact, Target::Event { client, .. }) => {
                client.sales_contact == principal.id
            }
            (Ownership::SupportContact, Target::Event { event, .. }) => {
                event.support_contact == principal.id
            }
            (Ownership::SupportContact, Target::Client(_) | Target::Contract(_)) => false,
        }
    }

    fn denial(&self) -> Denial {
        match self {
            Ownership::SalesContact => Denial::ownership(messages::NOT_SALES_CONTACT),
            Ownership::SupportContact => Denial::ownership(messages::NOT_SUPPORT_CONTACT),
        }
    }
}

/// `HasActiveContract`: at least one of the client's contracts is signed.
pub fn has_active_contract<'a>(client: &Client, contracts: impl IntoIterator<Item = &'a Contract>) -> bool {
    contracts
        .into_iter()
        .any(|contract| contract.client == client.id && contract.is_active())
}

/// Evaluates decisions against a fixed grant table.
#[derive(Debug, Clone, Copy)]
pub struct Authorizer<'a> {
    grants: &'a GrantTable,
}

impl<'a> Authorizer<'a> {
    pub fn new(grants: &'a GrantTable) -> Self {
        Self { grants }
    }

    /// Grant and refusal used for each (entity kind, action) pair.
    fn grant_rule(kind: EntityKind, action: Action) -> (Grant, Denial) {
        use messages::*;

        match (kind, action) {
            (EntityKind::Client, Action::Create) => (Grant::AddClient, Denial::grant(400, NOT_ALLOWED)),
            (EntityKind::Client, Action::Update) => {
                (Grant::ChangeClient, Denial::grant(405, NOT_A_SALES_MEMBER))
            }
            (EntityKind::Contract, Action::Create) => {
                (Grant::AddContract, Denial::grant(400, CONTRACT_SALES_ONLY))
            }
            (EntityKind::Contract, Action::Update) => {
                (Grant::ChangeContract, Denial::grant(400, NOT_ALLOWED))
            }
            (EntityKind::Event, Action::Create) => (Grant::AddEvent, Denial::grant(400, EVENT_SALES_ONLY)),
            (EntityKind::Event, Action::Update) => (Grant::ChangeEvent, Denial::grant(400, NOT_ALLOWED)),
        }
    }

    /// Coarse type-level check, run before any record is looked at.
    pub fn check_grant(&self, principal: &Principal, kind: EntityKind, action: Action) -> Decision {
        let (grant, denial) = Self::grant_rule(kind, action);
        if self.grants.has_grant(principal, grant) {
            Ok(())
        } else {
            tracing::warn!(
                principal = principal.id,
                entity = %kind,
                grant = %grant,
                "grant denied"
            );
            Err(denial)
        }
    }

    /// Object-level ownership check for an update of `target`.
    ///
    /// Events select the predicate by team: support principals must be the
    /// event's support contact and sales principals the client's sales
    /// contact. A principal outside both teams passes with either.
    pub fn check_ownership(&self, principal: &Principal, target: &Target<'_>) -> Decision {
        let outcome = match target {
            Target::Client(_) | Target::Contract(_) => Self::require(Ownership::SalesContact, principal, target),
            Target::Event { .. } => match principal.team {
                Some(Team::Support) => Self::require(Ownership::SupportContact, principal, target),
                Some(Team::Sales) => Self::require(Ownership::SalesContact, principal, target),
                None => {
                    if Ownership::SalesContact.holds(principal, target)
                        || Ownership::SupportContact.holds(principal, target)
                    {
                        Ok(())
                    } else {
                        Err(Denial::ownership(messages::NOT_EVENT_CONTACT))
                    }
                }
            },
        };

        if let Err(denial) = &outcome {
            tracing::warn!(
                principal = principal.id,
                entity = %target.kind(),
                reason = denial.reason.code(),
                "ownership denied"
            );
        }
        outcome
    }

    fn require(ownership: Ownership, principal: &Principal, target: &Target<'_>) -> Decision {
        if ownership.holds(principal, target) {
            Ok(())
        } else {
            Err(ownership.denial())
        }
    }

    pub fn create_client(&self, principal: &Principal) -> Decision {
        self.check_grant(principal, EntityKind::Client, Action::Create)
    }

    pub fn update_client(&self, principal: &Principal, client: &Client) -> Decision {
        self.check_grant(principal, EntityKind::Client, Action::Update)?;
        self.check_ownership(principal, &Target::Client(client))
    }

    pub fn create_contract(&self, principal: &Principal) -> Decision {
        self.check_grant(principal, EntityKind::Contract, Action::Create)
    }

    pub fn update_contract(&self, principal: &Principal, contract: &Contract) -> Decision {
        self.check_grant(principal, EntityKind::Contract, Action::Update)?;
        self.check_ownership(principal, &Target::Contract(contract))
    }

    /// Event creation is two-step: the grant, then the target client must
    /// hold a signed contract.
    pub fn create_event(&self, principal: &Principal, client_has_active_contract: bool) -> Decision {
        self.check_grant(principal, EntityKind::Event, Action::Create)?;
        self.check_active_contract(principal, client_has_active_contract)
    }

    /// Second step of event creation, for callers that must resolve the
    /// client between the grant check and this one.
    pub fn check_active_contract(&self, principal: &Principal, client_has_active_contract: bool) -> Decision {
        if client_has_active_contract {
            Ok(())
        } else {
            tracing::warn!(principal = principal.id, "event creation refused: no signed contract");
            Err(Denial::precondition(messages::NO_SIGNED_CONTRACT))
        }
    }

    pub fn update_event(&self, principal: &Principal, event: &Event, client: &Client) -> Decision {
        self.check_grant(principal, EntityKind::Event, Action::Update)?;
        self.check_ownership(principal, &Target::Event { event, client })
    }
}
