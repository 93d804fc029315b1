//! RPC procedure router.
//!
//! ARCHITECTURE
//! ============
//! Clients call procedures by dotted name (`todo.create`), carried over HTTP
//! as a path (`/rpc/todo/create`). Each call gets a fresh `Context` holding
//! the pool and the caller's session, if any. Input is validated before a
//! procedure runs; protected procedures reject callers without a session.
//!
//! The HTTP transport lives in `routes::rpc`; this module never sees
//! requests or responses.

pub mod error;
pub mod todos;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use validator::Validate;

use crate::services::session::AuthSession;

pub use error::{Issue, RpcError, validation_issues};

/// Per-call context.
pub struct Context {
    pub pool: PgPool,
    pub session: Option<AuthSession>,
}

impl Context {
    fn require_session(&self) -> Result<&AuthSession, RpcError> {
        self.session.as_ref().ok_or(RpcError::Unauthorized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    HealthCheck,
    AuthGetSession,
    PrivateData,
    TodoGetAll,
    TodoCreate,
    TodoToggle,
    TodoDelete,
}

impl Procedure {
    pub const ALL: [Procedure; 7] = [
        Self::HealthCheck,
        Self::AuthGetSession,
        Self::PrivateData,
        Self::TodoGetAll,
        Self::TodoCreate,
        Self::TodoToggle,
        Self::TodoDelete,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HealthCheck => "healthCheck",
            Self::AuthGetSession => "auth.getSession",
            Self::PrivateData => "privateData",
            Self::TodoGetAll => "todo.getAll",
            Self::TodoCreate => "todo.create",
            Self::TodoToggle => "todo.toggle",
            Self::TodoDelete => "todo.delete",
        }
    }

    /// Resolve a procedure from a URL path (`todo/getAll`) or dotted name.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.trim_matches('/').replace('/', ".");
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::PrivateData)
    }
}

/// Deserialize and validate procedure input.
///
/// # Errors
///
/// Returns `InvalidInput` listing every failed constraint.
pub fn parse_input<T: DeserializeOwned + Validate>(input: Value) -> Result<T, RpcError> {
    let parsed: T = serde_json::from_value(input)
        .map_err(|e| RpcError::InvalidInput(vec![Issue { path: Vec::new(), message: e.to_string() }]))?;
    parsed
        .validate()
        .map_err(|errors| RpcError::InvalidInput(validation_issues(&errors)))?;
    Ok(parsed)
}

fn to_output(value: &impl Serialize) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal("rpc output serialization failed", e))
}

/// Run one procedure.
///
/// # Errors
///
/// Returns the procedure's `RpcError`: bad input, missing session, or an
/// internal failure.
pub async fn call(ctx: &Context, procedure: Procedure, input: Value) -> Result<Value, RpcError> {
    if procedure.is_protected() {
        ctx.require_session()?;
    }

    match procedure {
        Procedure::HealthCheck => Ok(Value::String("OK".into())),
        Procedure::AuthGetSession => to_output(&ctx.session),
        Procedure::PrivateData => {
            let auth = ctx.require_session()?;
            Ok(serde_json::json!({ "message": "This is private", "user": auth.user }))
        }
        Procedure::TodoGetAll => to_output(&todos::get_all(ctx).await?),
        Procedure::TodoCreate => to_output(&todos::create(ctx, parse_input(input)?).await?),
        Procedure::TodoToggle => to_output(&todos::toggle(ctx, parse_input(input)?).await?),
        Procedure::TodoDelete => to_output(&todos::delete(ctx, parse_input(input)?).await?),
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
