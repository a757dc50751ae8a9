//! Database store module for the ledger API.
//!
//! ## Design decisions
//!
//! ### One Postgres adapter, kept backend-neutral in code
//! The Store contract (§6 of the spec) is satisfied here by a single
//! `sqlx::PgPool`/`sqlx::Transaction` adapter. Every function takes either a
//! `&PgPool` or a `&mut Transaction<'_, Postgres>` explicitly rather than
//! hiding the connection behind a trait object, matching how the teacher
//! repository's own store module is organized — but no SQL outside this
//! module, and no raw string-interpolated filters anywhere in it (§9).
//!
//! ### Decimal semantics
//! All amounts are `rust_decimal::Decimal`, persisted as `NUMERIC(28, 10)`.
//! Binary floating point never appears in amount arithmetic.
//!
//! ### Time source dependency
//! Every function that assigns a `createdAt`/`committedAt` takes a
//! `TimeSource` rather than calling `Timestamp::now()` directly, so tests
//! can mock time deterministically.

pub mod account_locks;
pub mod accounts;
pub mod api_keys;
pub mod balance;
pub mod entries;
pub mod enumerate;
pub mod events;

use thiserror::Error;

/// Transport-neutral error kinds (§7). `routes::ApiError` maps each variant
/// to its HTTP status without ever interpolating the underlying
/// `sqlx::Error`'s `Display` into the response body.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account not found")]
    AccountNotFound,
    #[error("an account named {0:?} already exists")]
    AccountNameConflict(String),
    #[error("entry not found")]
    EntryNotFound,
    #[error("api key not found")]
    ApiKeyNotFound,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::Invalid(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }
}
