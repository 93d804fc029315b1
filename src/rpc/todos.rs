//! `todo.*` procedures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{Context, RpcError};
use crate::services::todo::{self, Todo};

const UUID_HYPHENATED_LEN: usize = 36;

fn validate_uuid(id: &str) -> Result<(), ValidationError> {
    if id.len() == UUID_HYPHENATED_LEN && Uuid::try_parse(id).is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("uuid");
    err.message = Some("Invalid UUID".into());
    Err(err)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTodoInput {
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToggleTodoInput {
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteTodoInput {
    #[validate(custom(function = "validate_uuid"))]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteTodoOutput {
    pub success: bool,
}

fn parse_id(id: &str) -> Result<Uuid, RpcError> {
    Uuid::try_parse(id).map_err(|_| RpcError::InvalidInput(vec![super::Issue::new(&["id"], "Invalid UUID")]))
}

pub async fn get_all(ctx: &Context) -> Result<Vec<Todo>, RpcError> {
    Ok(todo::list_todos(&ctx.pool).await?)
}

pub async fn create(ctx: &Context, input: CreateTodoInput) -> Result<Todo, RpcError> {
    Ok(todo::create_todo(&ctx.pool, &input.text).await?)
}

/// Returns `None` when no todo has the given id.
pub async fn toggle(ctx: &Context, input: ToggleTodoInput) -> Result<Option<Todo>, RpcError> {
    let id = parse_id(&input.id)?;
    Ok(todo::set_completed(&ctx.pool, id, input.completed).await?)
}

/// Always reports success; deleting an absent id is a no-op.
pub async fn delete(ctx: &Context, input: DeleteTodoInput) -> Result<DeleteTodoOutput, RpcError> {
    let id = parse_id(&input.id)?;
    let removed = todo::delete_todo(&ctx.pool, id).await?;
    if !removed {
        tracing::debug!(todo_id = %id, "delete of absent todo");
    }
    Ok(DeleteTodoOutput { success: true })
}
