use serde_json::Value;

use super::validate::Payload;
use super::{today, CrmError};
use crate::authz::{Action, Authorizer, EntityKind, Target};
use crate::database::models::{Client, ClientDetail, ClientFields, NewClient};
use crate::identity::{GrantTable, Principal};
use crate::scope::{ClientFilter, ClientScope};
use crate::store::Store;

fn client_fields(body: &Value) -> Result<ClientFields, CrmError> {
    let mut p = Payload::new(body);
    let fields = ClientFields {
        first_name: p.text("first_name", 25),
        last_name: p.text("last_name", 25),
        email: p.text("email", 100),
        phone: p.text("phone", 20),
        mobile: p.text("mobile", 20),
        company_name: p.text("company_name", 250),
    };
    p.finish()?;
    Ok(fields)
}

pub struct ClientService<'a> {
    store: &'a dyn Store,
    authz: Authorizer<'a>,
}

impl<'a> ClientService<'a> {
    pub fn new(store: &'a dyn Store, grants: &'a GrantTable) -> Self {
        Self {
            store,
            authz: Authorizer::new(grants),
        }
    }

    pub async fn list(&self, principal: &Principal, filter: &ClientFilter) -> Result<Vec<Client>, CrmError> {
        Ok(self
            .store
            .list_clients(ClientScope::for_principal(principal), filter)
            .await?)
    }

    pub async fn retrieve(&self, principal: &Principal, id: i64) -> Result<ClientDetail, CrmError> {
        let client = self
            .store
            .find_client(ClientScope::for_principal(principal), id)
            .await?
            .ok_or(CrmError::NotFound)?;
        let links = self.store.client_links(client.id).await?;
        Ok(ClientDetail {
            client,
            events: links.events,
            contracts: links.contracts,
        })
    }

    /// The acting principal becomes the client's sales contact.
    pub async fn create(&self, principal: &Principal, body: &Value) -> Result<Client, CrmError> {
        self.authz.create_client(principal)?;
        let sales_contact = principal.id;
        let today = today();

        let fields = client_fields(body)?;
        let client = self
            .store
            .insert_client(NewClient {
                fields,
                sales_contact,
                today,
            })
            .await?;
        tracing::info!(client = client.id, sales_contact, "client created");
        Ok(client)
    }

    pub async fn update(&self, principal: &Principal, id: i64, body: &Value) -> Result<Client, CrmError> {
        self.authz.check_grant(principal, EntityKind::Client, Action::Update)?;
        let mut client = self.store.client(id).await?.ok_or(CrmError::NotFound)?;
        self.authz.check_ownership(principal, &Target::Client(&client))?;

        let fields = client_fields(body)?;
        client.apply(fields, principal.id, today());
        Ok(self.store.save_client(&client).await?)
    }
}
