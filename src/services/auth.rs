use serde::Serialize;
use serde_json::Value;

use super::validate::Payload;
use super::CrmError;
use crate::auth::{verify_password, AuthKeys, TokenPair, TokenType};
use crate::identity::Principal;
use crate::store::Store;

pub const INVALID_PASSWORD: &str = "Invalid Password";
pub const UNKNOWN_USER: &str = "User Does Not Exist";

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
}

pub struct AuthService<'a> {
    store: &'a dyn Store,
    keys: &'a AuthKeys,
}

impl<'a> AuthService<'a> {
    pub fn new(store: &'a dyn Store, keys: &'a AuthKeys) -> Self {
        Self { store, keys }
    }

    pub async fn login(&self, body: &Value) -> Result<TokenPair, CrmError> {
        let mut p = Payload::new(body);
        let username = p.raw_text("username");
        let password = p.raw_text("password");
        p.finish()?;

        let user = self
            .store
            .user_by_username(&username)
            .await?
            .ok_or(CrmError::Credentials(UNKNOWN_USER))?;
        if !verify_password(&password, &user.password_hash)? {
            tracing::warn!(user = user.id, "login refused: wrong password");
            return Err(CrmError::Credentials(INVALID_PASSWORD));
        }

        tracing::info!(user = user.id, "login");
        Ok(self.keys.issue_pair(user.id, &user.username)?)
    }

    pub async fn refresh(&self, body: &Value) -> Result<AccessToken, CrmError> {
        let mut p = Payload::new(body);
        let token = p.text("refresh", 4096);
        p.finish()?;

        let claims = self
            .keys
            .validate(&token, TokenType::Refresh)
            .map_err(|e| CrmError::Unauthorized(e.to_string()))?;
        let principal = self.principal(&claims.sub).await?;
        Ok(AccessToken {
            access: self.keys.issue_access(principal.id, &principal.username)?,
        })
    }

    /// Resolves a bearer access token to the principal it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, CrmError> {
        let claims = self
            .keys
            .validate(token, TokenType::Access)
            .map_err(|e| CrmError::Unauthorized(e.to_string()))?;
        self.principal(&claims.sub).await
    }

    async fn principal(&self, subject: &str) -> Result<Principal, CrmError> {
        let id = subject
            .parse()
            .map_err(|_| CrmError::Unauthorized("Invalid token subject".to_string()))?;
        let user = self
            .store
            .user_by_id(id)
            .await?
            .ok_or_else(|| CrmError::Unauthorized("User no longer exists".to_string()))?;
        Ok(Principal::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::database::models::NewUser;
    use crate::identity::Team;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use serde_json::json;

    async fn setup() -> (MemoryStore, AuthKeys) {
        let store = MemoryStore::new();
        store
            .insert_user(NewUser {
                username: "sales1".into(),
                password_hash: hash_password("vente1111").unwrap(),
                team: Some(Team::Sales),
            })
            .await
            .unwrap();
        let keys = AuthKeys::new("test-secret", Duration::minutes(5), Duration::hours(1)).unwrap();
        (store, keys)
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let (store, keys) = setup().await;
        let service = AuthService::new(&store, &keys);

        let pair = service
            .login(&json!({ "username": "sales1", "password": "vente1111" }))
            .await
            .unwrap();
        let principal = service.authenticate(&pair.access).await.unwrap();
        assert_eq!(principal.username, "sales1");
        assert_eq!(principal.team, Some(Team::Sales));

        // Refresh tokens do not authenticate
        assert!(matches!(
            service.authenticate(&pair.refresh).await,
            Err(CrmError::Unauthorized(_))
        ));

        let fresh = service.refresh(&json!({ "refresh": pair.refresh })).await.unwrap();
        assert!(service.authenticate(&fresh.access).await.is_ok());
    }

    #[tokio::test]
    async fn login_failures_are_distinguished() {
        let (store, keys) = setup().await;
        let service = AuthService::new(&store, &keys);

        let wrong = service.login(&json!({ "username": "sales1", "password": "nope" })).await;
        assert!(matches!(wrong, Err(CrmError::Credentials(INVALID_PASSWORD))));

        let unknown = service.login(&json!({ "username": "ghost", "password": "nope" })).await;
        assert!(matches!(unknown, Err(CrmError::Credentials(UNKNOWN_USER))));

        let empty = service.login(&json!({})).await;
        assert!(matches!(empty, Err(CrmError::Validation { .. })));
    }

    #[tokio::test]
    async fn passwords_are_compared_verbatim() {
        let (store, keys) = setup().await;
        let long = "x".repeat(200);
        for (name, password) in [("spaced", " secret "), ("long", long.as_str())] {
            store
                .insert_user(NewUser {
                    username: name.into(),
                    password_hash: hash_password(password).unwrap(),
                    team: None,
                })
                .await
                .unwrap();
        }
        let service = AuthService::new(&store, &keys);

        assert!(service
            .login(&json!({ "username": "spaced", "password": " secret " }))
            .await
            .is_ok());
        assert!(matches!(
            service.login(&json!({ "username": "spaced", "password": "secret" })).await,
            Err(CrmError::Credentials(INVALID_PASSWORD))
        ));
        assert!(service.login(&json!({ "username": "long", "password": long })).await.is_ok());
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let (store, keys) = setup().await;
        let service = AuthService::new(&store, &keys);
        let access = keys.issue_access(1, "sales1").unwrap();

        let result = service.refresh(&json!({ "refresh": access })).await;
        assert!(matches!(result, Err(CrmError::Unauthorized(_))));
    }
}
