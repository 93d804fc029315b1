//! Auth routes: the `/api/auth/*` catch-all plus session extractors.
//!
//! Every method on `/api/auth/{*path}` lands in `handle`, which dispatches on
//! `(method, path)` the way an embedded auth provider would.

use axum::body::Bytes;
use axum::extract::{FromRef, Path, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::de::DeserializeOwned;
use time::Duration;

use crate::rpc::validation_issues;
use crate::services::auth::{self as auth_svc, AuthError, SignInInput, SignUpInput};
use crate::services::session::{self, AuthSession, ClientInfo, SessionUser};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "better-auth.session_token";

// =============================================================================
// SESSION EXTRACTORS
// =============================================================================

/// The caller's session, if the cookie carries a valid one.
pub struct MaybeSession(pub Option<AuthSession>);

impl<S> axum::extract::FromRequestParts<S> for MaybeSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Ok(Self(None));
        }

        let app_state = AppState::from_ref(state);
        let session = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
        Ok(Self(session))
    }
}

// =============================================================================
// COOKIES
// =============================================================================

/// Session cookie. `max_age` of `None` makes it a browser-session cookie.
pub(crate) fn session_cookie(token: String, secure: bool, max_age: Option<Duration>) -> Cookie<'static> {
    let mut cookie = Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    if let Some(age) = max_age {
        cookie.set_max_age(age);
    }
    cookie
}

pub(crate) fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    session_cookie(String::new(), secure, Some(Duration::ZERO))
}

pub(crate) fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    ClientInfo {
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_owned()),
        user_agent: header(USER_AGENT.as_str()).map(str::to_owned),
    }
}

// =============================================================================
// ERRORS
// =============================================================================

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::UserAlreadyExists => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::PasswordHash(_) | AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "code": code, "message": message.into() }))).into_response()
}

fn auth_error_response(err: AuthError) -> Response {
    let status = auth_error_to_status(&err);
    let message = match &err {
        AuthError::Validation(errors) => validation_issues(errors)
            .into_iter()
            .next()
            .map_or_else(|| err.to_string(), |issue| issue.message),
        AuthError::PasswordHash(_) | AuthError::Db(_) => {
            tracing::error!(error = %err, "auth request failed");
            "Internal server error".to_owned()
        }
        _ => err.to_string(),
    };
    error_response(status, err.error_code(), message)
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY", e.to_string()))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `ANY /api/auth/{*path}`: dispatch to the matching auth endpoint.
pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match (&method, path.trim_matches('/')) {
        (&Method::POST, "sign-up/email") => sign_up(&state, jar, &headers, &body).await,
        (&Method::POST, "sign-in/email") => sign_in(&state, jar, &headers, &body).await,
        (&Method::POST, "sign-out") => sign_out(&state, jar).await,
        (&Method::GET, "get-session") => get_session(&state, &jar).await,
        (&Method::GET, "ok") => Json(serde_json::json!({ "ok": true })).into_response(),
        (_, other) => {
            tracing::debug!(%method, path = %other, "unknown auth endpoint");
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "Not found")
        }
    }
}

/// Create a session for `user`, attach the cookie, and build the JSON body.
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    headers: &HeaderMap,
    user: SessionUser,
    remember_me: bool,
    extra: serde_json::Value,
) -> Response {
    let ttl = state.session_ttl();
    let token = match session::create_session(&state.pool, user.id, ttl, &client_info(headers)).await {
        Ok((token, _)) => token,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", "Failed to create session");
        }
    };

    let max_age = remember_me.then_some(ttl);
    let jar = jar.add(session_cookie(token.clone(), state.config.cookie_secure, max_age));

    let mut body = serde_json::json!({ "token": token, "user": user });
    if let (Some(body), serde_json::Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (jar, Json(body)).into_response()
}

async fn sign_up(state: &AppState, jar: CookieJar, headers: &HeaderMap, body: &Bytes) -> Response {
    let input: SignUpInput = match parse_body(body) {
        Ok(input) => input,
        Err(resp) => return resp,
    };
    match auth_svc::sign_up(&state.pool, &input).await {
        Ok(user) => start_session(state, jar, headers, user, input.remember_me, serde_json::Value::Null).await,
        Err(e) => auth_error_response(e),
    }
}

async fn sign_in(state: &AppState, jar: CookieJar, headers: &HeaderMap, body: &Bytes) -> Response {
    let input: SignInInput = match parse_body(body) {
        Ok(input) => input,
        Err(resp) => return resp,
    };
    match auth_svc::sign_in(&state.pool, &input).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user signed in");
            let extra = serde_json::json!({ "redirect": false });
            start_session(state, jar, headers, user, input.remember_me, extra).await
        }
        Err(e) => auth_error_response(e),
    }
}

async fn sign_out(state: &AppState, jar: CookieJar) -> Response {
    if let Some(token) = jar.get(COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty()) {
        if let Err(e) = session::delete_session(&state.pool, token).await {
            tracing::warn!(error = %e, "session delete failed during sign-out");
        }
    }
    let jar = jar.add(clear_session_cookie(state.config.cookie_secure));
    (jar, Json(serde_json::json!({ "success": true }))).into_response()
}

async fn get_session(state: &AppState, jar: &CookieJar) -> Response {
    let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    if token.is_empty() {
        return Json(serde_json::Value::Null).into_response();
    }
    match session::validate_session(&state.pool, token).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "session lookup failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", "Failed to get session")
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
