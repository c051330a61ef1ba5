pub mod auth;
pub mod authz;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod scope;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::AuthKeys;
use crate::config::{AppConfig, SecurityConfig};
use crate::identity::GrantTable;
use crate::store::Store;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub grants: Arc<GrantTable>,
    pub keys: Arc<AuthKeys>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, grants: GrantTable, keys: AuthKeys) -> Self {
        Self {
            store,
            grants: Arc::new(grants),
            keys: Arc::new(keys),
        }
    }
}

/// Full router: public routes, bearer-protected routes and global layers.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.security))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        );
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/login", post(public::login_post))
        .route("/login/refresh", post(public::refresh_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{clients, contracts, events, me_get};

    Router::new()
        .route("/me", get(me_get))
        .route("/clients", get(clients::list).post(clients::create))
        .route("/clients/:id", get(clients::retrieve).put(clients::update))
        .route("/contracts", get(contracts::list).post(contracts::create))
        .route("/contracts/:id", get(contracts::retrieve).put(contracts::update))
        .route("/events", get(events::list).post(events::create))
        .route("/events/:id", get(events::retrieve).put(events::update))
        .route_layer(from_fn_with_state(state, middleware::require_principal))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    let origins: Vec<_> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
