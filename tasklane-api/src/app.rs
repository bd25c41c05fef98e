/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasklane_api::{app::AppState, config::Config};
/// use tasklane_shared::db::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = tasklane_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::{self, ApiResult},
    middleware::{
        rate_limit::{rate_limit, RateLimiter},
        security::SecurityHeadersLayer,
    },
};
use axum::{
    http::{header, HeaderMap, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tasklane_shared::{
    auth::{bearer::bearer_token, jwt::TokenService, password::HashParams},
    db::store::Store,
    models::user::User,
    services::{identity::IdentityService, tasks::TaskService},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token resolution
    pub identity: IdentityService,

    /// Owner-scoped task operations
    pub tasks: TaskService,

    /// Backing store
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let tokens = TokenService::new(&config.jwt.secret, config.jwt.ttl());
        let hash_params = HashParams::from(&config.password);

        Self {
            identity: IdentityService::new(store.clone(), tokens, hash_params),
            tasks: TaskService::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }

    /// Authentication stage of the request pipeline
    ///
    /// Reads the bearer token and resolves it to the calling user.
    pub async fn authenticate(&self, headers: &HeaderMap) -> ApiResult<User> {
        let token = bearer_token(headers)?;
        Ok(self.identity.resolve_identity(token).await?)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register
///     │   └── POST /login
///     └── /tasks/                 # bearer token required
///         ├── GET    /
///         ├── POST   /
///         ├── GET    /:id
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// Anything else falls through to a `RESOURCE_NOT_FOUND` envelope; a known
/// path with the wrong method gets a `METHOD_NOT_ALLOWED` envelope.
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS
/// 3. Rate limiting (only when `RATELIMIT_ENABLED`)
/// 4. Request tracing
/// 5. Panic catcher (`INTERNAL_SERVER_ERROR` envelope)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes);

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;
    let rate_limit_config = state.config.rate_limit.clone();

    let mut router = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .fallback(error::route_not_found)
        .layer(axum_middleware::map_response(error::method_not_allowed))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if rate_limit_config.enabled {
        tracing::info!(limit = %rate_limit_config.default_limit, "Rate limiting enabled");
        let limiter = RateLimiter::new(rate_limit_config.default_limit);
        router = router.layer(axum_middleware::from_fn_with_state(limiter, rate_limit));
    }

    router
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
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
