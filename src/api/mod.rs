use axum::{
    Router,
    http::{HeaderValue, header},
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{ArmyService, AuthService, TokenService};
use crate::state::SharedState;

mod armies;
pub mod auth;
mod error;
mod observability;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.shared.tokens
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn army_service(&self) -> &Arc<dyn ArmyService> {
        &self.shared.army_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let auth_config = &state.config().auth;
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let mut public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/health", get(observability::health));

    let mut protected_routes = create_protected_router();

    if auth_config.public_user_list {
        public_routes = public_routes.route("/auth", get(auth::list_users));
    } else {
        protected_routes = protected_routes.route("/auth", get(auth::list_users));
    }

    if auth_config.allow_user_deletion {
        protected_routes = protected_routes
            .route("/auth/{username}", delete(auth::delete_user_by_name))
            .route("/auth/id/{id}", delete(auth::delete_user_by_id));
    }

    let protected_routes = protected_routes.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::auth_middleware,
    ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route_layer(middleware::from_fn(observability::track_metrics))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .fallback(not_found)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0"),
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
}

/// Unknown paths and unsupported methods both answer 404 with an error body.
async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/armies",
            get(armies::list_armies).post(armies::create_army),
        )
        .route(
            "/armies/{id}",
            get(armies::get_army)
                .put(armies::update_army)
                .delete(armies::delete_army),
        )
        .route("/metrics", get(observability::get_metrics))
}
