//! ApiKeyStore (§4.6): bearer credential issuance and lookup. Tokens are
//! generated once, returned to the caller, and never stored in recoverable
//! form — only a SHA-256 hash is persisted, the same pattern the rest of
//! this codebase uses for content hashing.

use jiff_sqlx::Timestamp as SqlxTs;
use payloads::requests::CreateApiKey;
use payloads::{ApiKeyCreated, ApiKeyId, ApiKeySummary};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::time::TimeSource;

const TOKEN_BYTES: usize = 32;
const TOKEN_PREFIX: &str = "ltk_";

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    format!("{TOKEN_PREFIX}{}", hex::encode(bytes))
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub async fn create(
    pool: &PgPool,
    time_source: &TimeSource,
    req: CreateApiKey,
) -> Result<ApiKeyCreated, StoreError> {
    if req.label.trim().is_empty() {
        return Err(StoreError::invalid("label must not be empty"));
    }
    let token = generate_token();
    let token_hash = hash_token(&token);
    let id = ApiKeyId(Uuid::new_v4());
    let now = time_source.now();

    let summary = sqlx::query_as::<_, ApiKeySummary>(
        r#"
        INSERT INTO api_keys (id, label, token_hash, is_admin, created_at, revoked_at)
        VALUES ($1, $2, $3, $4, $5, NULL)
        RETURNING id, label, is_admin, created_at, revoked_at
        "#,
    )
    .bind(id)
    .bind(&req.label)
    .bind(&token_hash)
    .bind(req.is_admin)
    .bind(SqlxTs::from(now))
    .fetch_one(pool)
    .await?;

    Ok(ApiKeyCreated { summary, token })
}

pub async fn list(pool: &PgPool) -> Result<Vec<ApiKeySummary>, StoreError> {
    Ok(sqlx::query_as::<_, ApiKeySummary>(
        "SELECT id, label, is_admin, created_at, revoked_at FROM api_keys ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn revoke(
    pool: &PgPool,
    time_source: &TimeSource,
    id: ApiKeyId,
) -> Result<(), StoreError> {
    let now = time_source.now();
    let result = sqlx::query(
        "UPDATE api_keys SET revoked_at = $1 WHERE id = $2 AND revoked_at IS NULL",
    )
    .bind(SqlxTs::from(now))
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::ApiKeyNotFound);
    }
    Ok(())
}

/// A resolved credential: which key it was, and whether it grants admin
/// operations. Returns `Unauthorized` for an unknown or revoked token.
pub struct Resolved {
    pub id: ApiKeyId,
    pub is_admin: bool,
}

pub async fn resolve(pool: &PgPool, token: &str) -> Result<Resolved, StoreError> {
    let token_hash = hash_token(token);
    let row: Option<(ApiKeyId, bool)> = sqlx::query_as(
        "SELECT id, is_admin FROM api_keys WHERE token_hash = $1 AND revoked_at IS NULL",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    let (id, is_admin) = row.ok_or(StoreError::Unauthorized)?;
    Ok(Resolved { id, is_admin })
}
