//! Todo service: list, create, toggle, delete.
//!
//! Each operation is a single statement against the `todo` table. Missing
//! rows are not errors: toggling an absent id yields `None`, and deleting one
//! reports `false` so the caller can decide whether to care.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("todo text must not be empty")]
    EmptyText,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row mirrored from the `todo` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
}

/// List every todo, oldest first (v7 ids sort by creation time).
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_todos(pool: &PgPool) -> Result<Vec<Todo>, TodoError> {
    let rows = sqlx::query_as::<_, Todo>("SELECT id, text, completed FROM todo ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Insert a todo and return the stored row.
///
/// # Errors
///
/// Returns `EmptyText` for empty input, or a database error if the insert fails.
pub async fn create_todo(pool: &PgPool, text: &str) -> Result<Todo, TodoError> {
    if text.is_empty() {
        return Err(TodoError::EmptyText);
    }

    let todo = sqlx::query_as::<_, Todo>(
        "INSERT INTO todo (id, text) VALUES ($1, $2) RETURNING id, text, completed",
    )
    .bind(Uuid::now_v7())
    .bind(text)
    .fetch_one(pool)
    .await?;

    tracing::info!(todo_id = %todo.id, "todo created");
    Ok(todo)
}

/// Set `completed` on one todo. Returns `None` when the id does not exist.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn set_completed(pool: &PgPool, id: Uuid, completed: bool) -> Result<Option<Todo>, TodoError> {
    let todo = sqlx::query_as::<_, Todo>(
        "UPDATE todo SET completed = $2 WHERE id = $1 RETURNING id, text, completed",
    )
    .bind(id)
    .bind(completed)
    .fetch_optional(pool)
    .await?;
    Ok(todo)
}

/// Delete one todo. Returns whether a row was removed.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_todo(pool: &PgPool, id: Uuid) -> Result<bool, TodoError> {
    let result = sqlx::query("DELETE FROM todo WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[path = "todo_test.rs"]
mod tests;
