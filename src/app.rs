use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{IdentityVerifier, JwtError};
use crate::authz::{AuthorizationEngine, ConfigError, PolicyTable};
use crate::config::AppConfig;
use crate::database::{MissionStore, RoleStore};
use crate::handlers::{protected, public};
use crate::middleware::authorize_request;
use crate::services::{CascadeDeleter, RoleResolver};

/// Shared, cheaply cloneable application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<AuthorizationEngine>,
    pub roles: Arc<RoleResolver>,
    pub accounts: Arc<dyn RoleStore>,
    pub missions: Arc<dyn MissionStore>,
    pub cascade: CascadeDeleter,
    pub verifier: IdentityVerifier,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Policy(#[from] ConfigError),

    #[error(transparent)]
    Token(#[from] JwtError),
}

impl AppState {
    /// Wire the authorization components around the given stores
    pub fn new(
        config: AppConfig,
        policy: PolicyTable,
        accounts: Arc<dyn RoleStore>,
        missions: Arc<dyn MissionStore>,
    ) -> Result<Self, StartupError> {
        let engine = AuthorizationEngine::new(Arc::new(policy), &config.authz.public_paths)?
            .with_enrollment_paths(&config.authz.enrollment_paths)?;
        let verifier = IdentityVerifier::new(&config.security.jwt_secret)?;
        let roles = RoleResolver::new(
            accounts.clone(),
            config.authz.role_cache_ttl(),
            config.authz.role_lookup_timeout(),
        );

        Ok(Self {
            engine: Arc::new(engine),
            roles: Arc::new(roles),
            cascade: CascadeDeleter::new(missions.clone()),
            accounts,
            missions,
            verifier,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Behind the route gate
        .merge(me_routes())
        .merge(mission_routes())
        .merge(user_routes())
        .fallback(public::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), authorize_request))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(protected::me::get))
        .route("/api/me/sync", post(protected::me::sync))
}

fn mission_routes() -> Router<AppState> {
    use protected::missions;

    Router::new()
        .route("/api/missions", get(missions::list).post(missions::create))
        .route(
            "/api/missions/:id",
            get(missions::get).put(missions::update).delete(missions::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users/:identity/role", get(users::get_role).put(users::put_role))
        .route("/api/users/:identity/client", post(users::create_client))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
