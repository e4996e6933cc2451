use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenIssuer;
use crate::config::{AppConfig, Environment};
use crate::database::models::{Role, Service, Tariff};
use crate::database::repository::{StoreHealth, Store};
use crate::error::ApiError;
use crate::handlers::{health, protected, public};
use crate::middleware::{error_report_middleware, jwt_auth_middleware};
use crate::services::{ServiceOptions, Services};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub tokens: TokenIssuer,
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub fn new(store: &Store, tokens: TokenIssuer, options: ServiceOptions) -> Self {
        Self {
            services: Services::new(store, tokens.clone(), options),
            tokens,
            health: store.health.clone(),
        }
    }
}

/// Builds the full router: public and protected tiers, error reporting, CORS
/// and request tracing.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .merge(public_routes())
        .merge(protected_routes(state.tokens.clone()))
        .fallback(|| async { ApiError::not_found("route not found") })
        .layer(from_fn(error_report_middleware))
        .layer(cors_layer(config));

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/pub/users/signup", post(public::user_signup))
        .route("/pub/employee/signup", post(public::employee_signup))
        .route("/pub/users/signin", post(public::user_signin))
        .route("/pub/employee/signin", post(public::employee_signin))
        .route("/pub/roles", post(public::catalog_create::<Role>))
        .route("/pub/tariffs", post(public::catalog_create::<Tariff>))
        .route("/pub/services", post(public::catalog_create::<Service>))
}

fn protected_routes(tokens: TokenIssuer) -> Router<AppState> {
    use protected::{auth, employees, requests, settings, users};

    Router::new()
        // Session
        .route("/prot/auth/refresh", post(auth::refresh))
        .route("/prot/auth/whoami", get(auth::whoami))
        // Catalogs and the designation singleton
        .merge(catalog_routes::<Role>("/prot/roles"))
        .merge(catalog_routes::<Tariff>("/prot/tariffs"))
        .merge(catalog_routes::<Service>("/prot/services"))
        .route("/prot/settings", get(settings::get))
        // Identities
        .route("/prot/users", get(users::list))
        .route("/prot/users/:id", get(users::get).delete(users::delete))
        .route("/prot/employee", get(employees::list))
        .route("/prot/employee/:id", get(employees::get).delete(employees::delete))
        .route("/prot/employee/:id/service", post(employees::grant_specialty))
        .route("/prot/employee/:id/service/:service_id", delete(employees::revoke_specialty))
        // Request lifecycle
        .route("/prot/request", post(requests::create).get(requests::list))
        .route("/prot/request/:id", get(requests::get).delete(requests::delete))
        .route("/prot/request/:id/employee", patch(requests::assign_employee))
        .route("/prot/request/:id/status", patch(requests::change_status))
        .route_layer(from_fn_with_state(tokens, jwt_auth_middleware))
}

fn catalog_routes<T: crate::handlers::Catalog>(base: &str) -> Router<AppState> {
    use protected::catalog;

    Router::new().route(base, get(catalog::list::<T>)).route(
        &format!("{}/:id", base),
        get(catalog::get::<T>).put(catalog::rename::<T>).delete(catalog::delete::<T>),
    )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
