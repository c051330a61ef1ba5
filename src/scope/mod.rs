//! Visibility scopes for list and retrieve.
//!
//! A scope is derived from the principal alone and evaluated before any
//! per-object check. Records outside it do not exist as far as the caller is
//! concerned. Principals outside both teams fall through to [`ClientScope::All`]
//! and friends.

pub mod filter;

pub use filter::{ClientFilter, ContractFilter, EventFilter};

use crate::database::models::{Client, Contract, Event};
use crate::identity::{Principal, Team, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientScope {
    All,
    /// Clients whose `sales_contact` is the principal.
    OwnedBy(UserId),
    /// Clients with at least one event the principal supports.
    SupportedBy(UserId),
}

impl ClientScope {
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.team {
            Some(Team::Support) => ClientScope::SupportedBy(principal.id),
            Some(Team::Sales) => ClientScope::OwnedBy(principal.id),
            None => ClientScope::All,
        }
    }

    /// `events` must include every event of `client` for `SupportedBy` to
    /// answer correctly; unrelated events are ignored.
    pub fn admits<'a>(&self, client: &Client, events: impl IntoIterator<Item = &'a Event>) -> bool {
        match self {
            ClientScope::All => true,
            ClientScope::OwnedBy(user) => client.sales_contact == *user,
            ClientScope::SupportedBy(user) => events
                .into_iter()
                .any(|event| event.client == client.id && event.support_contact == *user),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractScope {
    All,
    OwnedBy(UserId),
}

impl ContractScope {
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.team {
            Some(Team::Sales) => ContractScope::OwnedBy(principal.id),
            _ => ContractScope::All,
        }
    }

    pub fn admits(&self, contract: &Contract) -> bool {
        match self {
            ContractScope::All => true,
            ContractScope::OwnedBy(user) => contract.sales_contact == *user,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    All,
    /// Events whose client's `sales_contact` is the principal.
    ClientOwnedBy(UserId),
    SupportedBy(UserId),
}

impl EventScope {
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.team {
            Some(Team::Sales) => EventScope::ClientOwnedBy(principal.id),
            Some(Team::Support) => EventScope::SupportedBy(principal.id),
            None => EventScope::All,
        }
    }

    /// `client` is the event's own client.
    pub fn admits(&self, event: &Event, client: &Client) -> bool {
        match self {
            EventScope::All => true,
            EventScope::ClientOwnedBy(user) => client.sales_contact == *user,
            EventScope::SupportedBy(user) => event.support_contact == *user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 2, 23).unwrap()
    }

    fn client(id: i64, sales_contact: UserId) -> Client {
        Client {
            id,
            first_name: "sam".into(),
            last_name: "idilbi".into(),
            email: "sam@test.com".into(),
            phone: "0222222222".into(),
            mobile: "0622222222".into(),
            company_name: "company two".into(),
            date_created: day(),
            date_updated: day(),
            sales_contact,
        }
    }

    fn event(id: i64, client: i64, support_contact: UserId) -> Event {
        Event {
            id,
            client,
            date_created: day(),
            date_updated: day(),
            support_contact,
            event_status: 1,
            attendees: 10,
            event_date: day(),
            notes: String::new(),
        }
    }

    #[test]
    fn scopes_follow_team() {
        let sales = Principal::new(1, "sales1", Some(Team::Sales));
        let support = Principal::new(2, "support1", Some(Team::Support));
        let nobody = Principal::new(3, "admin", None);

        assert_eq!(ClientScope::for_principal(&sales), ClientScope::OwnedBy(1));
        assert_eq!(ClientScope::for_principal(&support), ClientScope::SupportedBy(2));
        assert_eq!(ClientScope::for_principal(&nobody), ClientScope::All);

        assert_eq!(ContractScope::for_principal(&sales), ContractScope::OwnedBy(1));
        assert_eq!(ContractScope::for_principal(&support), ContractScope::All);
        assert_eq!(ContractScope::for_principal(&nobody), ContractScope::All);

        assert_eq!(EventScope::for_principal(&sales), EventScope::ClientOwnedBy(1));
        assert_eq!(EventScope::for_principal(&support), EventScope::SupportedBy(2));
        assert_eq!(EventScope::for_principal(&nobody), EventScope::All);
    }

    #[test]
    fn support_sees_only_clients_they_support() {
        let c = client(1, 10);
        let events = [event(1, 1, 20), event(2, 2, 30)];

        assert!(ClientScope::SupportedBy(20).admits(&c, &events));
        // 30 supports an event, just not one of this client's
        assert!(!ClientScope::SupportedBy(30).admits(&c, &events));
        let none: [Event; 0] = [];
        assert!(!ClientScope::SupportedBy(20).admits(&c, &none));
    }

    #[test]
    fn sales_sees_only_own_clients() {
        let c = client(1, 10);
        let none: [Event; 0] = [];
        assert!(ClientScope::OwnedBy(10).admits(&c, &none));
        assert!(!ClientScope::OwnedBy(11).admits(&c, &none));
        assert!(ClientScope::All.admits(&c, &none));
    }

    #[test]
    fn event_scope_for_sales_goes_through_client() {
        let c = client(1, 10);
        let e = event(1, 1, 20);

        assert!(EventScope::ClientOwnedBy(10).admits(&e, &c));
        assert!(!EventScope::ClientOwnedBy(20).admits(&e, &c));
        assert!(EventScope::SupportedBy(20).admits(&e, &c));
        assert!(!EventScope::SupportedBy(10).admits(&e, &c));
    }
}
