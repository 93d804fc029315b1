//! Page routes. The UI is a prebuilt SPA; the server only picks the shell,
//! stamps the active locale into it, and guards `/dashboard`.

use std::path::Path;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::i18n::resolve_locale;
use crate::routes::auth::MaybeSession;
use crate::state::AppState;

pub(crate) const LOGIN_REDIRECT: &str = "/auth/login?redirect=/dashboard";
const LANG_PLACEHOLDER: &str = "%lang%";

/// Served when the frontend bundle has not been built.
const FALLBACK_SHELL: &str = r#"<!doctype html>
<html lang="%lang%">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>TanStack Start Starter</title>
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#;

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

pub(crate) fn request_locale(query: &LocaleQuery, headers: &HeaderMap) -> &'static str {
    let accept = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
    resolve_locale(query.locale.as_deref(), accept)
}

/// Load `index.html` from the web bundle, or the built-in shell.
pub(crate) async fn render_shell(web_dir: &Path, lang: &str) -> String {
    let template = match tokio::fs::read_to_string(web_dir.join("index.html")).await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!(error = %e, "web bundle missing; serving fallback shell");
            FALLBACK_SHELL.to_owned()
        }
    };
    template.replace(LANG_PLACEHOLDER, lang)
}

/// `GET /`, `/auth/login`, `/auth/signup`, `/demo/*`.
pub async fn spa_shell(State(state): State<AppState>, Query(query): Query<LocaleQuery>, headers: HeaderMap) -> Html<String> {
    let lang = request_locale(&query, &headers);
    Html(render_shell(&state.config.web_dir, lang).await)
}

/// `GET /dashboard`: signed-in users only.
pub async fn dashboard(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<LocaleQuery>,
    headers: HeaderMap,
) -> Response {
    if session.is_none() {
        return Redirect::temporary(LOGIN_REDIRECT).into_response();
    }
    let lang = request_locale(&query, &headers);
    Html(render_shell(&state.config.web_dir, lang).await).into_response()
}
