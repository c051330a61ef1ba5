use serde_json::Value;

use super::validate::{does_not_exist, Payload};
use super::{today, CrmError};
use crate::authz::{Action, Authorizer, EntityKind, Target};
use crate::database::models::{Contract, ContractFields, NewContract};
use crate::identity::{GrantTable, Principal};
use crate::scope::{ContractFilter, ContractScope};
use crate::store::Store;

pub struct ContractService<'a> {
    store: &'a dyn Store,
    authz: Authorizer<'a>,
}

impl<'a> ContractService<'a> {
    pub fn new(store: &'a dyn Store, grants: &'a GrantTable) -> Self {
        Self {
            store,
            authz: Authorizer::new(grants),
        }
    }

    async fn fields(&self, body: &Value) -> Result<ContractFields, CrmError> {
        let mut p = Payload::new(body);
        let fields = ContractFields {
            client: p.integer("client"),
            signed_status: p.boolean_or("signed_status", false),
            amount: p.number("amount"),
            payment_due: p.date("payment_due"),
        };
        if !p.has_error("client") && self.store.client(fields.client).await?.is_none() {
            p.reject("client", does_not_exist(fields.client));
        }
        p.finish()?;
        Ok(fields)
    }

    pub async fn list(&self, principal: &Principal, filter: &ContractFilter) -> Result<Vec<Contract>, CrmError> {
        Ok(self
            .store
            .list_contracts(ContractScope::for_principal(principal), filter)
            .await?)
    }

    pub async fn retrieve(&self, principal: &Principal, id: i64) -> Result<Contract, CrmError> {
        self.store
            .find_contract(ContractScope::for_principal(principal), id)
            .await?
            .ok_or(CrmError::NotFound)
    }

    pub async fn create(&self, principal: &Principal, body: &Value) -> Result<Contract, CrmError> {
        self.authz.create_contract(principal)?;
        let sales_contact = principal.id;
        let today = today();

        let fields = self.fields(body).await?;
        let contract = self
            .store
            .insert_contract(NewContract {
                fields,
                sales_contact,
                today,
            })
            .await?;
        tracing::info!(contract = contract.id, client = contract.client, "contract created");
        Ok(contract)
    }

    pub async fn update(&self, principal: &Principal, id: i64, body: &Value) -> Result<Contract, CrmError> {
        self.authz.check_grant(principal, EntityKind::Contract, Action::Update)?;
        let mut contract = self.store.contract(id).await?.ok_or(CrmError::NotFound)?;
        self.authz.check_ownership(principal, &Target::Contract(&contract))?;

        let fields = self.fields(body).await?;
        contract.apply(fields, principal.id, today());
        Ok(self.store.save_contract(&contract).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::messages;
    use crate::database::models::{ClientFields, NewClient, NewUser};
    use crate::identity::Team;
    use crate::store::MemoryStore;
    use serde_json::json;

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

    async fn client_of(store: &MemoryStore, owner: &Principal) -> i64 {
        store
            .insert_client(NewClient {
                fields: ClientFields {
                    first_name: "sam".into(),
                    last_name: "idilbi".into(),
                    email: "sam@test.com".into(),
                    phone: "0222222222".into(),
                    mobile: "0622222222".into(),
                    company_name: "company two".into(),
                },
                sales_contact: owner.id,
                today: today(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn support_cannot_create() {
        let store = MemoryStore::new();
        let grants = GrantTable::default();
        let support = principal(&store, "support1", Team::Support).await;
        let service = ContractService::new(&store, &grants);

        match service.create(&support, &json!({})).await {
            Err(CrmError::Denied(d)) => {
                assert_eq!(d.status, 400);
                assert_eq!(d.message, messages::CONTRACT_SALES_ONLY);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_defaults_unsigned_and_requires_existing_client() {
        let store = MemoryStore::new();
        let grants = GrantTable::default();
        let sales = principal(&store, "sales1", Team::Sales).await;
        let client = client_of(&store, &sales).await;
        let service = ContractService::new(&store, &grants);

        let contract = service
            .create(&sales, &json!({ "client": client, "amount": 50, "payment_due": "2023-02-28" }))
            .await
            .unwrap();
        assert!(!contract.signed_status);
        assert_eq!(contract.sales_contact, sales.id);

        let dangling = service
            .create(&sales, &json!({ "client": 77, "amount": 50, "payment_due": "2023-02-28" }))
            .await;
        match dangling {
            Err(CrmError::Validation { field_errors }) => {
                assert_eq!(field_errors["client"], does_not_exist(77));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn only_the_owning_sales_contact_updates() {
        let store = MemoryStore::new();
        let grants = GrantTable::default();
        let a = principal(&store, "sales1", Team::Sales).await;
        let b = principal(&store, "sales2", Team::Sales).await;
        let client = client_of(&store, &a).await;
        let service = ContractService::new(&store, &grants);
        let body = json!({ "client": client, "amount": 50, "payment_due": "2023-02-28" });
        let contract = service.create(&a, &body).await.unwrap();

        match service.update(&b, contract.id, &body).await {
            Err(CrmError::Denied(d)) => {
                assert_eq!(d.status, 403);
                assert_eq!(d.message, messages::NOT_SALES_CONTACT);
            }
            other => panic!("unexpected {:?}", other),
        }

        let signed = json!({ "client": client, "amount": 75.5, "signed_status": true, "payment_due": "2023-03-01" });
        let updated = service.update(&a, contract.id, &signed).await.unwrap();
        assert!(updated.signed_status);
        assert_eq!(updated.amount, 75.5);
    }

    #[tokio::test]
    async fn sales_only_see_their_contracts() {
        let store = MemoryStore::new();
        let grants = GrantTable::default();
        let a = principal(&store, "sales1", Team::Sales).await;
        let b = principal(&store, "sales2", Team::Sales).await;
        let support = principal(&store, "support1", Team::Support).await;
        let client = client_of(&store, &a).await;
        let service = ContractService::new(&store, &grants);
        let contract = service
            .create(&a, &json!({ "client": client, "amount": 1, "payment_due": "2023-02-28" }))
            .await
            .unwrap();

        assert!(service.list(&b, &ContractFilter::default()).await.unwrap().is_empty());
        assert!(matches!(service.retrieve(&b, contract.id).await, Err(CrmError::NotFound)));
        assert_eq!(service.list(&support, &ContractFilter::default()).await.unwrap().len(), 1);
    }
}
