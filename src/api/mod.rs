//! HTTP API: routing, middleware and handlers.

pub mod error;
pub mod health;
pub mod questlines;

use std::time::Duration;

use axum::extract::OriginalUri;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use questlines_core::Database;

use crate::config::ServerConfig;
use crate::frontend;
use error::AppError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

/// Build the application: JSON API under the configured prefix, the
/// frontend bundle everywhere else.
pub fn create_router(db: Database, config: &ServerConfig) -> Router {
    let state = AppState { db };
    let prefix = config.api_prefix();

    let router = if prefix.is_empty() {
        Router::new().merge(api_routes())
    } else {
        Router::new().nest(&prefix, api_routes())
    };

    router
        .fallback_service(frontend::serve_dir(&config.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new())
                .layer(cors_layer(config)),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/up", get(health::up))
        .route(
            "/questlines",
            get(questlines::list_questlines).post(questlines::create_questline),
        )
        .route(
            "/questlines/{id}",
            get(questlines::get_questline)
                .put(questlines::update_questline)
                .delete(questlines::delete_questline),
        )
        .route("/questlines/{id}/export", get(questlines::export_questline))
        .fallback(api_not_found)
}

/// Unknown API paths answer JSON instead of falling through to the frontend.
async fn api_not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    tracing::debug!(%method, %uri, "No such API route");
    AppError::NotFound("No such API route".into())
}

/// `*` cannot be combined with credentials, so it mirrors the caller's
/// origin instead.
fn allow_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|origin| origin.trim() == "*") {
        tracing::warn!("CORS origin `*` configured: every origin is allowed");
        return AllowOrigin::mirror_request();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(&config.allowed_origins()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([HeaderName::from_static("link")])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}
