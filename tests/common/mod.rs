#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use crm_api::auth::{hash_password, AuthKeys};
use crm_api::config::AppConfig;
use crm_api::database::models::NewUser;
use crm_api::identity::{GrantTable, Team};
use crm_api::store::{MemoryStore, Store};
use crm_api::{app, AppState};

/// Seeded principals: (username, password, team).
pub const USERS: &[(&str, &str, Option<Team>)] = &[
    ("sales1", "vente1111", Some(Team::Sales)),
    ("sales2", "vente2222", Some(Team::Sales)),
    ("support1", "help1111", Some(Team::Support)),
    ("support2", "help2222", Some(Team::Support)),
    ("manager", "manage1111", None),
];

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
}

/// A logged-in principal.
pub struct Session<'a> {
    app: &'a TestApp,
    pub id: i64,
    pub token: String,
}

/// Starts the router on a free port over a freshly seeded in-memory store.
pub async fn spawn_app() -> Result<TestApp> {
    let store = Arc::new(MemoryStore::new());
    for (username, password, team) in USERS {
        store
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password(password)?,
                team: *team,
            })
            .await?;
    }

    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.security.jwt_secret = "integration-test-secret".to_string();

    let keys = AuthKeys::from_config(&config.security)?;
    let state = AppState::new(store.clone(), GrantTable::default(), keys);
    let router = app(state, &config);

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let app = TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?,
        store,
    };
    app.wait_ready().await?;
    Ok(app)
}

impl TestApp {
    async fn wait_ready(&self) -> Result<()> {
        for _ in 0..50 {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!("server did not become ready on {}", self.base_url)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login_response(&self, username: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?)
    }

    /// Logs in one of the seeded principals by username.
    pub async fn session(&self, username: &str) -> Result<Session<'_>> {
        let (_, password, _) = USERS
            .iter()
            .find(|(name, _, _)| *name == username)
            .with_context(|| format!("no seeded user {}", username))?;

        let resp = self.login_response(username, password).await?;
        anyhow::ensure!(resp.status() == StatusCode::OK, "login failed: {}", resp.status());
        let body: Value = resp.json().await?;
        let token = body["data"]["access"].as_str().context("no access token")?.to_string();

        let id = self
            .store
            .user_by_username(username)
            .await?
            .context("seeded user vanished")?
            .id;
        Ok(Session { app: self, id, token })
    }
}

pub fn client_body(last_name: &str) -> Value {
    json!({
        "first_name": "sam",
        "last_name": last_name,
        "email": format!("{}@test.com", last_name),
        "phone": "0222222222",
        "mobile": "0622222222",
        "company_name": "company two"
    })
}

pub fn contract_body(client: i64, signed: bool) -> Value {
    json!({
        "client": client,
        "signed_status": signed,
        "amount": 50,
        "payment_due": "2023-02-28"
    })
}

pub fn event_body(client: i64, support_contact: i64) -> Value {
    json!({
        "client": client,
        "support_contact": support_contact,
        "attendees": 10,
        "event_date": "2023-02-25",
        "notes": "first event"
    })
}

impl Session<'_> {
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self
            .app
            .client
            .get(self.app.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .app
            .client
            .post(self.app.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self
            .app
            .client
            .put(self.app.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?)
    }

    /// POSTs `raw` verbatim as a JSON body.
    pub async fn post_raw(&self, path: &str, raw: &str) -> Result<Response> {
        Ok(self
            .app
            .client
            .post(self.app.url(path))
            .bearer_auth(&self.token)
            .header("content-type", "application/json")
            .body(raw.to_string())
            .send()
            .await?)
    }

    /// POSTs and returns the created record's id, failing unless 201.
    pub async fn create(&self, path: &str, body: &Value) -> Result<i64> {
        let resp = self.post(path, body).await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed: {} {}", path, status, body);
        body["data"]["id"].as_i64().context("created record has no id")
    }

    pub async fn create_client(&self, last_name: &str) -> Result<i64> {
        self.create("/clients", &client_body(last_name)).await
    }

    pub async fn create_contract(&self, client: i64, signed: bool) -> Result<i64> {
        self.create("/contracts", &contract_body(client, signed)).await
    }

    pub async fn create_event(&self, client: i64, support_contact: i64) -> Result<i64> {
        self.create("/events", &event_body(client, support_contact)).await
    }
}

/// Splits a response into its status and JSON body.
pub async fn read(resp: Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let body = resp.json::<Value>().await?;
    Ok((status, body))
}

pub fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}
