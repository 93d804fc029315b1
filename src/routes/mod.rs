//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the SPA page routes, the RPC endpoint, the auth
//! catch-all, docs search, locale catalogs, and static assets.

pub mod auth;
pub mod i18n;
pub mod pages;
pub mod rpc;
pub mod search;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{any, get};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// CORS for a single trusted origin (with credentials) or, unset, any origin.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(raw) = origin else {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    };

    match HeaderValue::from_str(raw) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::HEAD])
            .allow_headers([CONTENT_TYPE]),
        Err(e) => {
            tracing::warn!(origin = %raw, error = %e, "invalid CORS_ORIGIN; allowing any origin");
            cors_layer(None)
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());
    let assets = ServeDir::new(state.config.web_dir.join("assets"));

    Router::new()
        .route("/", get(pages::spa_shell))
        .route("/dashboard", get(pages::dashboard))
        .route("/auth/login", get(pages::spa_shell))
        .route("/auth/signup", get(pages::spa_shell))
        .route("/demo", get(pages::spa_shell))
        .route("/demo/{*rest}", get(pages::spa_shell))
        .route("/api/auth/{*path}", any(auth::handle))
        .route("/api/search", get(search::search))
        .route("/api/i18n", get(i18n::current))
        .route("/api/i18n/{locale}", get(i18n::catalog))
        .route("/rpc/{*path}", get(rpc::handle).post(rpc::handle))
        .route("/healthz", get(healthz))
        .nest_service("/assets", assets)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
