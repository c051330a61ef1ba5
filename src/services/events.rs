use serde_json::Value;

use super::validate::{does_not_exist, Payload, NEGATIVE, NOT_AN_INTEGER};
use super::{today, CrmError};
use crate::authz::{Action, Authorizer, EntityKind, Target};
use crate::database::models::{Client, Event, EventFields, NewEvent};
use crate::identity::{GrantTable, Principal};
use crate::scope::{EventFilter, EventScope};
use crate::store::Store;

pub struct EventService<'a> {
    store: &'a dyn Store,
    authz: Authorizer<'a>,
}

impl<'a> EventService<'a> {
    pub fn new(store: &'a dyn Store, grants: &'a GrantTable) -> Self {
        Self {
            store,
            authz: Authorizer::new(grants),
        }
    }

    /// Validated fields plus the status id to store: the requested one or
    /// the default `status = false` row.
    async fn fields(&self, body: &Value) -> Result<(EventFields, i64), CrmError> {
        let mut p = Payload::new(body);
        let fields = EventFields {
            client: p.integer("client"),
            support_contact: p.integer("support_contact"),
            event_status: p.optional_integer("event_status"),
            attendees: {
                let n = p.integer("attendees");
                if n < 0 {
                    p.reject("attendees", NEGATIVE);
                }
                i32::try_from(n).unwrap_or_else(|_| {
                    p.reject("attendees", NOT_AN_INTEGER);
                    0
                })
            },
            event_date: p.date("event_date"),
            notes: p.optional_text("notes", 400),
        };

        if !p.has_error("client") && self.store.client(fields.client).await?.is_none() {
            p.reject("client", does_not_exist(fields.client));
        }
        if !p.has_error("support_contact") && self.store.user_by_id(fields.support_contact).await?.is_none() {
            p.reject("support_contact", does_not_exist(fields.support_contact));
        }
        if let Some(id) = fields.event_status {
            if !p.has_error("event_status") && self.store.event_status(id).await?.is_none() {
                p.reject("event_status", does_not_exist(id));
            }
        }
        p.finish()?;

        // Only a valid payload may create the default status row.
        let status = match fields.event_status {
            Some(id) => id,
            None => self.store.default_event_status().await?.id,
        };
        Ok((fields, status))
    }

    /// The client named by the payload, if the payload names one that exists.
    async fn payload_client(&self, body: &Value) -> Result<Client, CrmError> {
        let mut p = Payload::new(body);
        let id = p.integer("client");
        if p.has_error("client") {
            return Err(p.into_error());
        }
        match self.store.client(id).await? {
            Some(client) => Ok(client),
            None => {
                p.reject("client", does_not_exist(id));
                Err(p.into_error())
            }
        }
    }

    pub async fn list(&self, principal: &Principal, filter: &EventFilter) -> Result<Vec<Event>, CrmError> {
        Ok(self
            .store
            .list_events(EventScope::for_principal(principal), filter)
            .await?)
    }

    pub async fn retrieve(&self, principal: &Principal, id: i64) -> Result<Event, CrmError> {
        self.store
            .find_event(EventScope::for_principal(principal), id)
            .await?
            .ok_or(CrmError::NotFound)
    }

    /// Grant first, then the target client must hold a signed contract.
    /// Other fields are only validated once both pass.
    pub async fn create(&self, principal: &Principal, body: &Value) -> Result<Event, CrmError> {
        self.authz.check_grant(principal, EntityKind::Event, Action::Create)?;
        let client = self.payload_client(body).await?;
        let active = self.store.has_active_contract(client.id).await?;
        self.authz.check_active_contract(principal, active)?;

        let today = today();
        let (fields, event_status) = self.fields(body).await?;
        let event = self
            .store
            .insert_event(NewEvent {
                fields,
                event_status,
                today,
            })
            .await?;
        tracing::info!(event = event.id, client = event.client, "event created");
        Ok(event)
    }

    pub async fn update(&self, principal: &Principal, id: i64, body: &Value) -> Result<Event, CrmError> {
        self.authz.check_grant(principal, EntityKind::Event, Action::Update)?;
        let mut event = self.store.event(id).await?.ok_or(CrmError::NotFound)?;
        let client = self.store.client(event.client).await?.ok_or(CrmError::NotFound)?;
        self.authz.check_ownership(
            principal,
            &Target::Event {
                event: &event,
                client: &client,
            },
        )?;

        let (fields, event_status) = self.fields(body).await?;
        event.apply(fields, event_status, today());
        Ok(self.store.save_event(&event).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{messages, DenialReason};
    use crate::database::models::{ClientFields, ContractFields, NewClient, NewContract, NewUser};
    use crate::identity::Team;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct World {
        store: MemoryStore,
        sales: Principal,
        support: Principal,
        other_support: Principal,
        client: i64,
    }

    async fn principal(store: &MemoryStore, name: &str, team: Team) -> Principal {
        let user = store
            .insert_user(NewUser {
                username: name.into(),
                password_hash: "unused".into(),
                team: Some(team),
            })
            .await
            .unwrap();
        Principal::from(&user)
    }

    async fn world(signed: bool) -> World {
        let store = MemoryStore::new();
        let sales = principal(&store, "sales1", Team::Sales).await;
        let support = principal(&store, "support1", Team::Support).await;
        let other_support = principal(&store, "support2", Team::Support).await;
        let client = store
            .insert_client(NewClient {
                fields: ClientFields {
                    first_name: "sam".into(),
                    last_name: "idilbi".into(),
                    email: "sam@test.com".into(),
                    phone: "0222222222".into(),
                    mobile: "0622222222".into(),
                    company_name: "company two".into(),
                },
                sales_contact: sales.id,
                today: today(),
            })
            .await
            .unwrap()
            .id;
        store
            .insert_contract(NewContract {
                fields: ContractFields {
                    client,
                    signed_status: signed,
                    amount: 50.0,
                    payment_due: today(),
                },
                sales_contact: sales.id,
                today: today(),
            })
            .await
            .unwrap();
        World {
            store,
            sales,
            support,
            other_support,
            client,
        }
    }

    fn body(client: i64, support: i64) -> Value {
        json!({
            "client": client,
            "support_contact": support,
            "attendees": 10,
            "event_date": "2023-02-25",
            "notes": "first event"
        })
    }

    #[tokio::test]
    async fn create_requires_a_signed_contract() {
        let w = world(false).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);

        match service.create(&w.sales, &body(w.client, w.support.id)).await {
            Err(CrmError::Denied(d)) => {
                assert_eq!(d.reason, DenialReason::PreconditionFailed);
                assert_eq!(d.status, 403);
                assert_eq!(d.message, messages::NO_SIGNED_CONTRACT);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(w.store.list_events(EventScope::All, &EventFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_uses_default_status() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);

        let event = service.create(&w.sales, &body(w.client, w.support.id)).await.unwrap();
        let status = w.store.event_status(event.event_status).await.unwrap().unwrap();
        assert!(!status.status);
    }

    #[tokio::test]
    async fn grant_is_checked_before_the_payload() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);

        match service.create(&w.support, &json!({ "client": "nope" })).await {
            Err(CrmError::Denied(d)) => assert_eq!(d.message, messages::EVENT_SALES_ONLY),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_client_is_a_validation_error() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);

        match service.create(&w.sales, &body(99, w.support.id)).await {
            Err(CrmError::Validation { field_errors }) => assert!(field_errors.contains_key("client")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn support_updates_only_their_events() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);
        let event = service.create(&w.sales, &body(w.client, w.support.id)).await.unwrap();

        match service.update(&w.other_support, event.id, &body(w.client, w.support.id)).await {
            Err(CrmError::Denied(d)) => assert_eq!(d.message, messages::NOT_SUPPORT_CONTACT),
            other => panic!("unexpected {:?}", other),
        }

        let mut changed = body(w.client, w.support.id);
        changed["attendees"] = json!(42);
        let updated = service.update(&w.support, event.id, &changed).await.unwrap();
        assert_eq!(updated.attendees, 42);

        // The client's sales contact may update too
        let again = service.update(&w.sales, event.id, &changed).await.unwrap();
        assert_eq!(again.id, event.id);
    }

    #[tokio::test]
    async fn invalid_payload_creates_no_default_status() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);

        let mut bad = body(w.client, w.support.id);
        bad["event_date"] = json!("someday");
        assert!(matches!(
            service.create(&w.sales, &bad).await,
            Err(CrmError::Validation { .. })
        ));
        assert!(w.store.event_status(1).await.unwrap().is_none());

        let event = service.create(&w.sales, &body(w.client, w.support.id)).await.unwrap();
        assert!(w.store.event_status(event.event_status).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn negative_attendees_rejected() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);

        let mut bad = body(w.client, w.support.id);
        bad["attendees"] = json!(-1);
        match service.create(&w.sales, &bad).await {
            Err(CrmError::Validation { field_errors }) => assert_eq!(field_errors["attendees"], NEGATIVE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn scopes_differ_by_team() {
        let w = world(true).await;
        let grants = GrantTable::default();
        let service = EventService::new(&w.store, &grants);
        let event = service.create(&w.sales, &body(w.client, w.support.id)).await.unwrap();

        assert_eq!(service.list(&w.sales, &EventFilter::default()).await.unwrap().len(), 1);
        assert_eq!(service.list(&w.support, &EventFilter::default()).await.unwrap().len(), 1);
        assert!(service.list(&w.other_support, &EventFilter::default()).await.unwrap().is_empty());
        assert!(matches!(service.retrieve(&w.other_support, event.id).await, Err(CrmError::NotFound)));
    }
}
