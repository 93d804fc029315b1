//! RPC transport: `GET|POST /rpc/{*path}`.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;

use crate::routes::auth::MaybeSession;
use crate::rpc::{self, Context, Issue, Procedure, RpcError};
use crate::state::AppState;

/// Decode the request body as procedure input. An empty body is `null`.
pub(crate) fn decode_input(body: &[u8]) -> Result<Value, RpcError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| RpcError::InvalidInput(vec![Issue { path: Vec::new(), message: format!("malformed JSON body: {e}") }]))
}

pub async fn handle(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(path): Path<String>,
    body: Bytes,
) -> Response {
    let Some(procedure) = Procedure::from_path(&path) else {
        tracing::debug!(%path, "rpc: unknown procedure");
        return RpcError::NotFound(path).into_response();
    };

    let input = match decode_input(&body) {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };

    let ctx = Context { pool: state.pool.clone(), session };
    match rpc::call(&ctx, procedure, input).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => {
            tracing::info!(procedure = procedure.name(), code = e.code(), "rpc: call failed");
            e.into_response()
        }
    }
}
