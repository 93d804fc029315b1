//! Session management.
//!
//! ARCHITECTURE
//! ============
//! HTTP auth uses opaque random session tokens carried in an HttpOnly cookie.
//! The database stores only the SHA-256 digest of each token, so a leaked
//! `sessions` table cannot be replayed as cookies.
//!
//! Expired rows are ignored on lookup rather than swept eagerly.

use std::fmt::Write;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Digest stored in place of the raw token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// User row returned from session validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Session plus its owner, as exposed by `get-session` and `auth.getSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub session: Session,
    pub user: SessionUser,
}

/// Request metadata recorded alongside a new session.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Create a session for the given user, returning the raw token and the row.
pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl: Duration,
    client: &ClientInfo,
) -> Result<(String, Session), sqlx::Error> {
    let token = generate_token();
    let id = Uuid::now_v7();
    let expires_at = OffsetDateTime::now_utc() + ttl;

    let row = sqlx::query(
        r"INSERT INTO sessions (id, token_hash, user_id, expires_at, ip_address, user_agent)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING created_at",
    )
    .bind(id)
    .bind(hash_token(&token))
    .bind(user_id)
    .bind(expires_at)
    .bind(&client.ip_address)
    .bind(&client.user_agent)
    .fetch_one(pool)
    .await?;

    let session = Session {
        id,
        user_id,
        expires_at,
        created_at: row.get("created_at"),
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
    };
    Ok((token, session))
}

/// Validate a session token and return the session with its user.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<AuthSession>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT
              s.id AS session_id,
              s.expires_at,
              s.created_at AS session_created_at,
              s.ip_address,
              s.user_agent,
              u.id AS user_id,
              u.name,
              u.email,
              u.email_verified,
              u.image,
              u.created_at AS user_created_at,
              u.updated_at AS user_updated_at
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token_hash = $1 AND s.expires_at > now()",
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let user_id: Uuid = r.get("user_id");
        AuthSession {
            session: Session {
                id: r.get("session_id"),
                user_id,
                expires_at: r.get("expires_at"),
                created_at: r.get("session_created_at"),
                ip_address: r.get("ip_address"),
                user_agent: r.get("user_agent"),
            },
            user: SessionUser {
                id: user_id,
                name: r.get("name"),
                email: r.get("email"),
                email_verified: r.get("email_verified"),
                image: r.get("image"),
                created_at: r.get("user_created_at"),
                updated_at: r.get("user_updated_at"),
            },
        }
    }))
}

/// Delete a session by token.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
