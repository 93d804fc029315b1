use std::fs;

use axum::body::Body;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::*;
use crate::docs::{DocsIndex, parse_page};
use crate::state::test_helpers;

struct Fixture {
    router: Router,
    _dirs: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dirs = tempfile::tempdir().unwrap();
    let locales = dirs.path().join("locales");
    let web = dirs.path().join("web");
    fs::create_dir_all(&locales).unwrap();
    fs::create_dir_all(web.join("assets")).unwrap();
    fs::write(locales.join("global-en.po"), "msgid \"Home\"\nmsgstr \"Home\"\n").unwrap();
    fs::write(locales.join("global-id.po"), "msgid \"Home\"\nmsgstr \"Beranda\"\n").unwrap();
    fs::write(web.join("assets/app.js"), "console.log('app');").unwrap();

    let mut config = test_helpers::test_config();
    config.locales_dir = locales;
    config.web_dir = web;
    let docs = DocsIndex::from_pages(vec![
        parse_page("/docs/deploy".into(), "# Deploy\n\nShip the server binary.\n", "deploy").unwrap(),
    ]);

    let state = test_helpers::test_app_state_with(config, docs);
    Fixture { router: app(state), _dirs: dirs }
}

async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

// =============================================================================
// health / rpc
// =============================================================================

#[tokio::test]
async fn healthz_is_ok() {
    let fx = fixture();
    let resp = send(&fx.router, get("/healthz")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn rpc_health_check_over_post_and_get() {
    let fx = fixture();
    let post = send(&fx.router, post_json("/rpc/healthCheck", "")).await;
    assert_eq!(post.status(), StatusCode::OK);
    assert_eq!(body_json(post).await, json!("OK"));

    let get_resp = send(&fx.router, get("/rpc/healthCheck")).await;
    assert_eq!(body_json(get_resp).await, json!("OK"));
}

#[tokio::test]
async fn rpc_get_session_without_cookie_is_null() {
    let fx = fixture();
    let resp = send(&fx.router, get("/rpc/auth/getSession")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await.is_null());
}

#[tokio::test]
async fn rpc_private_data_without_session_is_unauthorized() {
    let fx = fixture();
    let resp = send(&fx.router, post_json("/rpc/privateData", "{}")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn rpc_create_with_empty_text_reports_issue() {
    let fx = fixture();
    let resp = send(&fx.router, post_json("/rpc/todo/create", r#"{"text":""}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["message"], "Input validation failed");
    assert_eq!(body["data"]["issues"][0]["path"], json!(["text"]));
}

#[tokio::test]
async fn rpc_malformed_json_is_bad_request() {
    let fx = fixture();
    let resp = send(&fx.router, post_json("/rpc/todo/create", "{not json")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rpc_unknown_procedure_is_not_found() {
    let fx = fixture();
    let resp = send(&fx.router, post_json("/rpc/todo/archive", "{}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["code"], "NOT_FOUND");
}

#[test]
fn decode_input_treats_blank_body_as_null() {
    assert_eq!(rpc::decode_input(b"").unwrap(), Value::Null);
    assert_eq!(rpc::decode_input(b" \n").unwrap(), Value::Null);
    assert_eq!(rpc::decode_input(br#"{"a":1}"#).unwrap(), json!({ "a": 1 }));
}

// =============================================================================
// pages
// =============================================================================

#[tokio::test]
async fn dashboard_without_session_redirects_to_login() {
    let fx = fixture();
    let resp = send(&fx.router, get("/dashboard")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers()[LOCATION], pages::LOGIN_REDIRECT);
}

#[tokio::test]
async fn public_pages_serve_shell_with_locale() {
    let fx = fixture();
    for uri in ["/?locale=id", "/auth/login?locale=id", "/auth/signup?locale=id", "/demo/form/simple?locale=id"] {
        let resp = send(&fx.router, get(uri)).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert!(body_text(resp).await.contains(r#"<html lang="id">"#), "{uri}");
    }
}

#[tokio::test]
async fn shell_uses_accept_language_then_default() {
    let fx = fixture();
    let req = Request::builder()
        .uri("/")
        .header("accept-language", "id-ID,id;q=0.9")
        .body(Body::empty())
        .unwrap();
    assert!(body_text(send(&fx.router, req).await).await.contains(r#"lang="id""#));
    assert!(body_text(send(&fx.router, get("/?locale=zz")).await).await.contains(r#"lang="en""#));
}

#[tokio::test]
async fn shell_prefers_built_index_html() {
    let dirs = tempfile::tempdir().unwrap();
    fs::write(dirs.path().join("index.html"), "<html data-lang=\"%lang%\">bundle</html>").unwrap();
    let html = pages::render_shell(dirs.path(), "id").await;
    assert_eq!(html, "<html data-lang=\"id\">bundle</html>");
}

#[tokio::test]
async fn assets_are_served_from_web_dir() {
    let fx = fixture();
    let resp = send(&fx.router, get("/assets/app.js")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "console.log('app');");
}

// =============================================================================
// i18n / search
// =============================================================================

#[tokio::test]
async fn i18n_catalog_for_supported_locale() {
    let fx = fixture();
    let body = body_json(send(&fx.router, get("/api/i18n/id")).await).await;
    assert_eq!(body["locale"], "id");
    assert_eq!(body["messages"]["Home"], "Beranda");
}

#[tokio::test]
async fn i18n_unsupported_locale_falls_back_to_default() {
    let fx = fixture();
    let body = body_json(send(&fx.router, get("/api/i18n/fr")).await).await;
    assert_eq!(body["locale"], "en");
    assert_eq!(body["messages"]["Home"], "Home");
}

#[tokio::test]
async fn i18n_current_resolves_from_query() {
    let fx = fixture();
    let body = body_json(send(&fx.router, get("/api/i18n?locale=id")).await).await;
    assert_eq!(body["locale"], "id");
}

#[tokio::test]
async fn search_returns_matches_and_empty_for_blank_query() {
    let fx = fixture();
    let hits = body_json(send(&fx.router, get("/api/search?query=deploy")).await).await;
    assert_eq!(hits[0]["type"], "page");
    assert_eq!(hits[0]["url"], "/docs/deploy");

    let none = body_json(send(&fx.router, get("/api/search")).await).await;
    assert_eq!(none, json!([]));
}

// =============================================================================
// auth catch-all
// =============================================================================

#[tokio::test]
async fn auth_ok_endpoint() {
    let fx = fixture();
    let body = body_json(send(&fx.router, get("/api/auth/ok")).await).await;
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn auth_unknown_endpoint_is_not_found() {
    let fx = fixture();
    let resp = send(&fx.router, get("/api/auth/reset-everything")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let wrong_method = send(&fx.router, get("/api/auth/sign-in/email")).await;
    assert_eq!(wrong_method.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_get_session_without_cookie_is_null() {
    let fx = fixture();
    let body = body_json(send(&fx.router, get("/api/auth/get-session")).await).await;
    assert!(body.is_null());
}

#[tokio::test]
async fn auth_sign_out_without_cookie_still_clears_it() {
    let fx = fixture();
    let resp = send(&fx.router, post_json("/api/auth/sign-out", "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[SET_COOKIE].to_str().unwrap().to_owned();
    assert!(cookie.starts_with(&format!("{}=;", auth::COOKIE_NAME)));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(body_json(resp).await, json!({ "success": true }));
}

#[tokio::test]
async fn auth_sign_up_rejects_bad_bodies_before_db() {
    let fx = fixture();
    let malformed = send(&fx.router, post_json("/api/auth/sign-up/email", "{")).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(malformed).await["code"], "INVALID_REQUEST_BODY");

    let invalid = send(
        &fx.router,
        post_json("/api/auth/sign-up/email", r#"{"name":"Ada","email":"nope","password":"hunter2hunter2"}"#),
    )
    .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body = body_json(invalid).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Invalid email");
}

#[test]
fn cors_layer_accepts_configured_or_any_origin() {
    let _any = cors_layer(None);
    let _one = cors_layer(Some("http://localhost:5173"));
    let _bad = cors_layer(Some("bad\norigin"));
}
