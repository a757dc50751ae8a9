//! Shared pagination and ordering policy across Accounts, Entries, and API
//! keys (§4.5). Each entity module builds its own `sqlx::QueryBuilder`
//! query (filters and continuation keys are always bound parameters, never
//! string-interpolated — §9), but validates its page parameters and
//! assembles the final `Page<T>` through the helpers here so the three
//! entities share one notion of what a page looks like.

use payloads::{Ordering, Page};
use uuid::Uuid;

use super::StoreError;

pub const DEFAULT_MAX_RESULTS: i64 = 1000;
pub const MAX_MAX_RESULTS: i64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub limit: i64,
    pub skip: Option<i64>,
    pub continuation_token: Option<Uuid>,
    pub descending: bool,
}

/// Validate and normalize the raw enumeration query parameters (§4.5).
/// `skip` and `continuation_token` are mutually exclusive.
pub fn resolve_page_params(
    max_results: Option<u32>,
    skip: Option<u32>,
    continuation_token: Option<Uuid>,
    ordering: Ordering,
) -> Result<PageParams, StoreError> {
    if skip.is_some() && continuation_token.is_some() {
        return Err(StoreError::invalid(
            "skip and continuationToken are mutually exclusive",
        ));
    }
    let limit = match max_results {
        Some(0) => {
            return Err(StoreError::invalid("maxResults must be at least 1"));
        }
        Some(n) if n as i64 > MAX_MAX_RESULTS => {
            return Err(StoreError::invalid(format!(
                "maxResults must be at most {MAX_MAX_RESULTS}"
            )));
        }
        Some(n) => n as i64,
        None => DEFAULT_MAX_RESULTS,
    };
    let descending = matches!(
        ordering,
        Ordering::CreatedDescending | Ordering::AmountDescending
    );
    Ok(PageParams {
        limit,
        skip: skip.map(|s| s as i64),
        continuation_token,
        descending,
    })
}

/// Assemble the final page. `records_remaining` is the count of rows
/// matching the filter that come strictly after the last row of this page
/// in the requested ordering — computed by the caller with a second,
/// keyset-scoped count query so the `endOfResults`/`continuationToken`
/// invariant in §4.5 holds even with concurrent appends.
pub fn make_page<T>(
    objects: Vec<T>,
    total_records: i64,
    records_remaining: i64,
    last_id: Option<Uuid>,
) -> Page<T> {
    let end_of_results = records_remaining == 0;
    Page {
        total_records,
        objects,
        records_remaining,
        end_of_results,
        continuation_token: if end_of_results {
            None
        } else {
            last_id.map(|id| id.to_string())
        },
    }
}
