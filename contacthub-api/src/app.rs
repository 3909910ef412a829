/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use contacthub_api::{app::{build_router, AppState}, config::Config};
/// use contacthub_shared::db::pool::{create_pool, DatabaseConfig};
/// use contacthub_shared::{mail::LogMailer, store::postgres::PgStore};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(&DatabaseConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), Arc::new(LogMailer), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use contacthub_shared::{mail::Mailer, store::Store};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Outgoing mail
    pub mailer: Arc<dyn Mailer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/
///     ├── /users/
///     │   ├── POST /signup
///     │   ├── POST /login
///     │   └── GET|PUT|DELETE /:id          (authenticated)
///     ├── /tokens/
///     │   ├── POST /acquire
///     │   ├── POST /renew
///     │   └── POST /revoke
///     ├── /contacts/                       (authenticated)
///     │   ├── POST|GET /
///     │   ├── GET|PUT|DELETE /:id
///     │   └── GET /:id/addresses
///     ├── /addresses/                      (authenticated)
///     │   ├── POST /
///     │   └── GET|PUT|DELETE /:id
///     └── /confirmation-codes/
///         ├── POST /send
///         └── POST /verify
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let auth = || axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let user_routes = Router::new()
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route_layer(auth())
        .route("/signup", post(routes::users::signup))
        .route("/login", post(routes::users::login));

    let token_routes = Router::new()
        .route("/acquire", post(routes::tokens::acquire))
        .route("/renew", post(routes::tokens::renew))
        .route("/revoke", post(routes::tokens::revoke));

    let contact_routes = Router::new()
        .route(
            "/",
            post(routes::contacts::create_contact).get(routes::contacts::list_contacts),
        )
        .route(
            "/:id",
            get(routes::contacts::get_contact)
                .put(routes::contacts::update_contact)
                .delete(routes::contacts::delete_contact),
        )
        .route("/:id/addresses", get(routes::addresses::list_contact_addresses))
        .route_layer(auth());

    let address_routes = Router::new()
        .route("/", post(routes::addresses::create_address))
        .route(
            "/:id",
            get(routes::addresses::get_address)
                .put(routes::addresses::update_address)
                .delete(routes::addresses::delete_address),
        )
        .route_layer(auth());

    let confirmation_routes = Router::new()
        .route("/send", post(routes::confirmation_codes::send_code))
        .route("/verify", post(routes::confirmation_codes::verify_code));

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/tokens", token_routes)
        .nest("/contacts", contact_routes)
        .nest("/addresses", address_routes)
        .nest("/confirmation-codes", confirmation_routes);

    let cors = cors_layer(&state.config.api.cors_origins);
    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Permissive when `*` is configured, otherwise limited to the listed origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
