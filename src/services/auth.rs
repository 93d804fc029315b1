//! Email and password auth: sign-up, sign-in, and Argon2id password hashing.
//!
//! Passwords are hashed with Argon2id (PHC string format). Emails are stored
//! normalized so lookups are case-insensitive.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use serde::Deserialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::services::session::SessionUser;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl AuthError {
    /// Grepable error code sent to clients.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::InvalidCredentials => "INVALID_EMAIL_OR_PASSWORD",
            Self::PasswordHash(_) | Self::Db(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

fn default_remember_me() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
    #[validate(url(message = "Invalid image URL"))]
    pub image: Option<String>,
    #[serde(default = "default_remember_me")]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default = "default_remember_me")]
    pub remember_me: bool,
}

#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Hash a password into a PHC-format Argon2id string.
///
/// # Errors
///
/// Returns `PasswordHash` if salt encoding or hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// # Errors
///
/// Returns `PasswordHash` if the stored hash is malformed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn user_from_row(r: &sqlx::postgres::PgRow) -> SessionUser {
    SessionUser {
        id: r.get("id"),
        name: r.get("name"),
        email: r.get("email"),
        email_verified: r.get("email_verified"),
        image: r.get("image"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

/// Register a new user.
///
/// # Errors
///
/// Returns `Validation` for bad input, `UserAlreadyExists` if the email is
/// taken, or a database/hashing error.
pub async fn sign_up(pool: &PgPool, input: &SignUpInput) -> Result<SessionUser, AuthError> {
    input.validate()?;
    let email = normalize_email(&input.email);
    let password_hash = hash_password(&input.password)?;

    let row = sqlx::query(
        r"INSERT INTO users (id, name, email, image, password_hash)
          VALUES ($1, $2, $3, $4, $5)
          ON CONFLICT (email) DO NOTHING
          RETURNING id, name, email, email_verified, image, created_at, updated_at",
    )
    .bind(Uuid::now_v7())
    .bind(input.name.trim())
    .bind(&email)
    .bind(&input.image)
    .bind(&password_hash)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(AuthError::UserAlreadyExists);
    };
    let user = user_from_row(&row);
    tracing::info!(user_id = %user.id, "user signed up");
    Ok(user)
}

/// Authenticate with email and password.
///
/// # Errors
///
/// Returns `InvalidCredentials` for an unknown email or wrong password.
pub async fn sign_in(pool: &PgPool, input: &SignInInput) -> Result<SessionUser, AuthError> {
    input.validate()?;
    let email = normalize_email(&input.email);

    let row = sqlx::query(
        r"SELECT id, name, email, email_verified, image, created_at, updated_at, password_hash
          FROM users
          WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(AuthError::InvalidCredentials);
    };
    let stored: String = row.get("password_hash");
    if !verify_password(&input.password, &stored)? {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user_from_row(&row))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
