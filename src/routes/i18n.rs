//! Locale catalog routes.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};

use crate::routes::pages::{LocaleQuery, request_locale};
use crate::state::AppState;

/// `GET /api/i18n/{locale}`: activated messages for a locale. Unsupported
/// locales get the default locale's messages.
pub async fn catalog(State(state): State<AppState>, Path(locale): Path<String>) -> Response {
    let i18n = state.catalogs.get(&locale).await;
    Json(&*i18n).into_response()
}

/// `GET /api/i18n`: messages for the locale resolved from the request.
pub async fn current(State(state): State<AppState>, Query(query): Query<LocaleQuery>, headers: HeaderMap) -> Response {
    let locale = request_locale(&query, &headers);
    let i18n = state.catalogs.get(locale).await;
    Json(&*i18n).into_response()
}
