use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EntryId, EntryKind, Ordering};

pub const ACCOUNT_NAME_MAX_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    pub name: String,
    pub notes: Option<String>,
    /// If present and > 0, a genesis Balance entry is created immediately
    /// (§4.1). Omitted or zero means no genesis snapshot yet.
    pub initial_balance: Option<Decimal>,
}

/// Body of `PUT /v1/accounts/{id}/credits` and `.../debits`. Accepts either
/// a single entry or a batch; exactly one of the two fields must be set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppendEntries {
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
    pub entries: Option<Vec<AppendEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEntry {
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// Body of `POST /v1/accounts/{id}/commit`. `None`/omitted `entry_guids`
/// commits every pending entry; `Some` commits exactly the named ids.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub entry_guids: Option<Vec<EntryId>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationQuery {
    pub max_results: Option<u32>,
    pub skip: Option<u32>,
    pub continuation_token: Option<uuid::Uuid>,
    pub ordering: Option<Ordering>,
}

/// `GET /v1/accounts` query parameters, extending the shared enumeration
/// parameters with a name search filter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountEnumerationQuery {
    #[serde(flatten)]
    pub page: EnumerationQuery,
    pub name_contains: Option<String>,
}

/// `POST /v1/accounts/{id}/entries/enumerate` body.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntryEnumerationQuery {
    #[serde(flatten)]
    pub page: EnumerationQuery,
    pub kind: Option<EntryKind>,
    pub is_committed: Option<bool>,
    pub created_after: Option<jiff::Timestamp>,
    pub created_before: Option<jiff::Timestamp>,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    /// Balance entries are excluded unless this is explicitly true.
    #[serde(default)]
    pub include_balance_entries: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PendingFilter {
    All,
    CreditsOnly,
    DebitsOnly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListPendingQuery {
    pub filter: Option<PendingFilter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAsOfQuery {
    pub as_of: jiff::Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKey {
    pub label: String,
    #[serde(default)]
    pub is_admin: bool,
}
