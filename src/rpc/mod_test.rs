use serde_json::json;

use super::todos::{CreateTodoInput, DeleteTodoInput, ToggleTodoInput};
use super::*;
use crate::state::test_helpers;

fn anonymous_ctx() -> Context {
    Context { pool: test_helpers::test_app_state().pool, session: None }
}

fn signed_in_ctx() -> Context {
    Context {
        pool: test_helpers::test_app_state().pool,
        session: Some(test_helpers::auth_session("Ada", "ada@example.com")),
    }
}

fn issues(err: RpcError) -> Vec<Issue> {
    match err {
        RpcError::InvalidInput(issues) => issues,
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

// =============================================================================
// Procedure names
// =============================================================================

#[test]
fn every_procedure_round_trips_through_its_path() {
    for procedure in Procedure::ALL {
        let path = procedure.name().replace('.', "/");
        assert_eq!(Procedure::from_path(&path), Some(procedure), "path {path}");
        assert_eq!(Procedure::from_path(procedure.name()), Some(procedure));
    }
}

#[test]
fn from_path_tolerates_surrounding_slashes() {
    assert_eq!(Procedure::from_path("/todo/getAll/"), Some(Procedure::TodoGetAll));
}

#[test]
fn unknown_paths_resolve_to_none() {
    assert_eq!(Procedure::from_path("todo/archive"), None);
    assert_eq!(Procedure::from_path("healthcheck"), None);
    assert_eq!(Procedure::from_path(""), None);
}

#[test]
fn only_private_data_is_protected() {
    let protected: Vec<_> = Procedure::ALL.into_iter().filter(|p| p.is_protected()).collect();
    assert_eq!(protected, vec![Procedure::PrivateData]);
}

// =============================================================================
// Input validation
// =============================================================================

#[test]
fn create_input_accepts_non_empty_text() {
    let input: CreateTodoInput = parse_input(json!({ "text": "Buy milk" })).unwrap();
    assert_eq!(input.text, "Buy milk");
}

#[test]
fn create_input_rejects_empty_text() {
    let issues = issues(parse_input::<CreateTodoInput>(json!({ "text": "" })).unwrap_err());
    assert_eq!(issues, vec![Issue::new(&["text"], "Text must not be empty")]);
}

#[test]
fn create_input_rejects_missing_and_mistyped_fields() {
    assert!(matches!(parse_input::<CreateTodoInput>(json!({})), Err(RpcError::InvalidInput(_))));
    assert!(matches!(parse_input::<CreateTodoInput>(json!({ "text": 5 })), Err(RpcError::InvalidInput(_))));
    assert!(matches!(parse_input::<CreateTodoInput>(Value::Null), Err(RpcError::InvalidInput(_))));
}

#[test]
fn toggle_input_requires_hyphenated_uuid() {
    let ok: ToggleTodoInput =
        parse_input(json!({ "id": "0190b6a4-7c1e-7d2a-9b3c-1234567890ab", "completed": true })).unwrap();
    assert!(ok.completed);

    let bad = issues(parse_input::<ToggleTodoInput>(json!({ "id": "not-a-uuid", "completed": true })).unwrap_err());
    assert_eq!(bad, vec![Issue::new(&["id"], "Invalid UUID")]);

    let simple = parse_input::<ToggleTodoInput>(json!({ "id": "0190b6a47c1e7d2a9b3c1234567890ab", "completed": true }));
    assert!(simple.is_err());
}

#[test]
fn toggle_input_requires_boolean_completed() {
    let err = parse_input::<ToggleTodoInput>(json!({ "id": "0190b6a4-7c1e-7d2a-9b3c-1234567890ab", "completed": "yes" }));
    assert!(matches!(err, Err(RpcError::InvalidInput(_))));
}

#[test]
fn delete_input_rejects_bad_uuid() {
    assert!(parse_input::<DeleteTodoInput>(json!({ "id": "123" })).is_err());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn error_codes_and_statuses_line_up() {
    let cases = [
        (RpcError::InvalidInput(Vec::new()), "BAD_REQUEST", 400),
        (RpcError::Unauthorized, "UNAUTHORIZED", 401),
        (RpcError::NotFound("x".into()), "NOT_FOUND", 404),
        (RpcError::Internal, "INTERNAL_SERVER_ERROR", 500),
    ];
    for (err, code, status) in cases {
        assert_eq!(err.code(), code);
        assert_eq!(err.status().as_u16(), status);
    }
}

#[test]
fn empty_text_service_error_maps_to_bad_request() {
    let err: RpcError = crate::services::todo::TodoError::EmptyText.into();
    assert_eq!(issues(err)[0].path, vec!["text".to_owned()]);
}

// =============================================================================
// call
// =============================================================================

#[tokio::test]
async fn health_check_returns_ok() {
    let out = call(&anonymous_ctx(), Procedure::HealthCheck, Value::Null).await.unwrap();
    assert_eq!(out, json!("OK"));
}

#[tokio::test]
async fn get_session_without_session_is_null() {
    let out = call(&anonymous_ctx(), Procedure::AuthGetSession, Value::Null).await.unwrap();
    assert!(out.is_null());
}

#[tokio::test]
async fn get_session_returns_session_and_user() {
    let out = call(&signed_in_ctx(), Procedure::AuthGetSession, Value::Null).await.unwrap();
    assert_eq!(out["user"]["email"], "ada@example.com");
    assert!(out["session"]["id"].is_string());
}

#[tokio::test]
async fn private_data_requires_session() {
    let err = call(&anonymous_ctx(), Procedure::PrivateData, Value::Null).await.unwrap_err();
    assert!(matches!(err, RpcError::Unauthorized));
}

#[tokio::test]
async fn private_data_includes_user() {
    let out = call(&signed_in_ctx(), Procedure::PrivateData, Value::Null).await.unwrap();
    assert_eq!(out["message"], "This is private");
    assert_eq!(out["user"]["name"], "Ada");
}

#[tokio::test]
async fn invalid_todo_input_fails_before_any_query() {
    let ctx = anonymous_ctx();
    let create = call(&ctx, Procedure::TodoCreate, json!({ "text": "" })).await.unwrap_err();
    assert_eq!(create.code(), "BAD_REQUEST");
    let toggle = call(&ctx, Procedure::TodoToggle, json!({ "id": "nope", "completed": false })).await.unwrap_err();
    assert_eq!(toggle.code(), "BAD_REQUEST");
    let delete = call(&ctx, Procedure::TodoDelete, json!({})).await.unwrap_err();
    assert_eq!(delete.code(), "BAD_REQUEST");
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
async fn todo_lifecycle_against_live_db() {
    let ctx = Context { pool: test_helpers::live_pool().await, session: None };

    let created = call(&ctx, Procedure::TodoCreate, json!({ "text": "Buy milk" })).await.unwrap();
    assert_eq!(created["text"], "Buy milk");
    assert_eq!(created["completed"], false);
    let id = created["id"].as_str().unwrap().to_owned();

    let toggled = call(&ctx, Procedure::TodoToggle, json!({ "id": id, "completed": true })).await.unwrap();
    assert_eq!(toggled["completed"], true);

    let all = call(&ctx, Procedure::TodoGetAll, Value::Null).await.unwrap();
    assert!(all.as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));

    let deleted = call(&ctx, Procedure::TodoDelete, json!({ "id": id })).await.unwrap();
    assert_eq!(deleted, json!({ "success": true }));

    // Deleting again still reports success, and toggling the gone row yields null.
    let again = call(&ctx, Procedure::TodoDelete, json!({ "id": id })).await.unwrap();
    assert_eq!(again, json!({ "success": true }));
    let missing = call(&ctx, Procedure::TodoToggle, json!({ "id": id, "completed": false })).await.unwrap();
    assert!(missing.is_null());
}
