pub mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{APIClient, ClientError};

use derive_more::Display;
use jiff::Timestamp;
#[cfg(feature = "use-sqlx")]
use jiff_sqlx::Timestamp as SqlxTs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id type wrappers help ensure we don't mix up ids for different tables.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct AccountId(pub Uuid);

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct EntryId(pub Uuid);

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type), sqlx(transparent))]
pub struct ApiKeyId(pub Uuid);

/// The three kinds of row that can appear in an account's entry history.
///
/// `Balance` entries are never appended directly by a caller; they are
/// created only by the commit procedure (`BalanceEngine::commit`).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "use-sqlx",
    sqlx(type_name = "entry_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Credit,
    Debit,
    Balance,
}

impl EntryKind {
    pub fn is_credit_or_debit(&self) -> bool {
        !matches!(self, EntryKind::Balance)
    }
}

/// A named ledger container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub notes: Option<String>,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub created_at: Timestamp,
}

/// One row in an account's append-only history: a Credit, a Debit, or a
/// Balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Only set for `Balance` entries: the id of the prior Balance entry in
    /// the chain, or `None` for the genesis snapshot.
    pub replaces: Option<EntryId>,
    pub is_committed: bool,
    /// The Balance entry that committed this entry; for a Balance entry
    /// itself this is a self-reference set at creation.
    pub committed_by_entry_id: Option<EntryId>,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "OptionalTimestamp"))]
    pub committed_at: Option<Timestamp>,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub created_at: Timestamp,
}

/// Summarizes a set of pending entries of one polarity (all credits, or all
/// debits) for a `BalanceView`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub count: usize,
    pub total_amount: Decimal,
    pub entries: Vec<Entry>,
}

/// The balance snapshot and pending activity for a single account, as
/// returned by `GET /v1/accounts/{id}/balance` and `GET /v1/balances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub account_id: AccountId,
    pub name: String,
    pub created_at: Timestamp,
    pub latest_balance_entry_id: Option<EntryId>,
    pub balance_timestamp: Option<Timestamp>,
    pub committed_balance: Decimal,
    pub pending_balance: Decimal,
    pub pending_credits: EntrySummary,
    pub pending_debits: EntrySummary,
    pub committed_entry_ids: Vec<EntryId>,
}

/// The single shape returned by `GetBalanceAsOf` — deliberately not the full
/// `BalanceView`; see DESIGN.md for why the source SDK's reuse of that shape
/// here is not reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAsOf {
    pub account_id: AccountId,
    pub as_of: Timestamp,
    pub amount: Decimal,
}

/// The outcome of a chain-verification pass over one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub account_id: AccountId,
    pub valid: bool,
}

/// A bearer credential resolving to a `Principal`; ambient, not part of the
/// ledger's own invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySummary {
    pub id: ApiKeyId,
    pub label: String,
    pub is_admin: bool,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "OptionalTimestamp"))]
    pub revoked_at: Option<Timestamp>,
}

/// Returned exactly once, at creation, since the raw token is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCreated {
    #[serde(flatten)]
    pub summary: ApiKeySummary,
    pub token: String,
}

/// Shared ordering policy across Accounts, Entries, and API keys (§4.5).
/// Amount orderings apply to Entries only; applied to Accounts they fall
/// back to the matching Created ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Ordering {
    #[default]
    CreatedAscending,
    CreatedDescending,
    AmountAscending,
    AmountDescending,
}

/// A single page of results from an `Enumerate` call, in the requested
/// ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_records: i64,
    pub objects: Vec<T>,
    pub records_remaining: i64,
    pub end_of_results: bool,
    pub continuation_token: Option<String>,
}

/// Basic service metadata returned by `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

/// `sqlx`'s `try_from` attribute needs a concrete intermediate type for
/// nullable `timestamptz` columns; this decodes as `Option<SqlxTs>` so
/// fields like `Entry::committed_at` and `ApiKeySummary::revoked_at` can
/// convert straight into `Option<jiff::Timestamp>`.
#[cfg(feature = "use-sqlx")]
#[derive(sqlx::Type)]
#[sqlx(transparent)]
pub struct OptionalTimestamp(Option<SqlxTs>);

#[cfg(feature = "use-sqlx")]
impl TryFrom<OptionalTimestamp> for Option<Timestamp> {
    type Error = std::convert::Infallible;

    fn try_from(value: OptionalTimestamp) -> Result<Self, Self::Error> {
        Ok(value.0.map(Timestamp::from))
    }
}
