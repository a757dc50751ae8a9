//! EntryBook (§4.2): appending pending Credit/Debit entries, canceling a
//! pending entry, listing pending entries, and enumerating full history.

use jiff_sqlx::Timestamp as SqlxTs;
use payloads::requests::{
    AppendEntries, EntryEnumerationQuery, ListPendingQuery, PendingFilter,
};
use payloads::{AccountId, Entry, EntryId, EntryKind, Page};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::account_locks::AccountLockTable;
use super::enumerate::{make_page, resolve_page_params};
use super::events::{LedgerEvent, Observer};
use super::StoreError;
use crate::time::TimeSource;

/// A single entry's body is either the `amount`/`notes` pair directly on
/// the request, or a batch in `entries` — exactly one must be present
/// (§4.2).
fn expand_entries(req: &AppendEntries) -> Result<Vec<(Decimal, Option<String>)>, StoreError> {
    match (&req.amount, &req.entries) {
        (Some(_), Some(_)) => Err(StoreError::invalid(
            "specify either amount or entries, not both",
        )),
        (None, None) => Err(StoreError::invalid("amount or entries is required")),
        (Some(amount), None) => {
            if amount.is_sign_negative() || amount.is_zero() {
                return Err(StoreError::invalid("amount must be positive"));
            }
            Ok(vec![(*amount, req.notes.clone())])
        }
        (None, Some(entries)) => {
            if entries.is_empty() {
                return Err(StoreError::invalid("entries must not be empty"));
            }
            entries
                .iter()
                .map(|e| {
                    if e.amount.is_sign_negative() || e.amount.is_zero() {
                        Err(StoreError::invalid("amount must be positive"))
                    } else {
                        Ok((e.amount, e.notes.clone()))
                    }
                })
                .collect()
        }
    }
}

async fn append(
    pool: &PgPool,
    locks: &AccountLockTable,
    observer: &dyn Observer,
    time_source: &TimeSource,
    account_id: AccountId,
    kind: EntryKind,
    req: AppendEntries,
) -> Result<Vec<Entry>, StoreError> {
    let bodies = expand_entries(&req)?;
    let _guard = locks.lock(account_id).await;

    // Confirm the account exists before taking the lock's critical section
    // any further; `FOREIGN KEY` would also catch this but we want the
    // `AccountNotFound` variant, not a raw database error.
    super::accounts::get_by_id(pool, account_id).await?;

    let mut tx = pool.begin().await?;
    let now = time_source.now();
    let mut created = Vec::with_capacity(bodies.len());
    for (amount, notes) in bodies {
        let id = EntryId(Uuid::new_v4());
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries
                (id, account_id, kind, amount, description, replaces,
                 is_committed, committed_by_entry_id, committed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, NULL, false, NULL, NULL, $6)
            RETURNING id, account_id, kind, amount, description, replaces,
                      is_committed, committed_by_entry_id, committed_at, created_at
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(kind)
        .bind(amount)
        .bind(notes)
        .bind(SqlxTs::from(now))
        .fetch_one(&mut *tx)
        .await?;
        created.push(entry);
    }
    tx.commit().await?;

    for entry in &created {
        observer.notify(&LedgerEvent::EntryAppended {
            account_id,
            entry_id: entry.id,
        });
    }
    Ok(created)
}

pub async fn append_credit(
    pool: &PgPool,
    locks: &AccountLockTable,
    observer: &dyn Observer,
    time_source: &TimeSource,
    account_id: AccountId,
    req: AppendEntries,
) -> Result<Vec<Entry>, StoreError> {
    append(pool, locks, observer, time_source, account_id, EntryKind::Credit, req).await
}

pub async fn append_debit(
    pool: &PgPool,
    locks: &AccountLockTable,
    observer: &dyn Observer,
    time_source: &TimeSource,
    account_id: AccountId,
    req: AppendEntries,
) -> Result<Vec<Entry>, StoreError> {
    append(pool, locks, observer, time_source, account_id, EntryKind::Debit, req).await
}

/// Cancel a pending entry (§4.2). A committed entry, a `Balance` entry, or
/// an entry belonging to a different account cannot be canceled.
pub async fn cancel(
    pool: &PgPool,
    locks: &AccountLockTable,
    observer: &dyn Observer,
    account_id: AccountId,
    entry_id: EntryId,
) -> Result<(), StoreError> {
    let _guard = locks.lock(account_id).await;
    let entry = sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, kind, amount, description, replaces,
               is_committed, committed_by_entry_id, committed_at, created_at
        FROM entries WHERE id = $1 AND account_id = $2
        "#,
    )
    .bind(entry_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::EntryNotFound)?;

    if entry.kind == EntryKind::Balance {
        return Err(StoreError::invalid("a Balance entry cannot be canceled"));
    }
    if entry.is_committed {
        return Err(StoreError::conflict("a committed entry cannot be canceled"));
    }

    sqlx::query("DELETE FROM entries WHERE id = $1")
        .bind(entry_id)
        .execute(pool)
        .await?;

    observer.notify(&LedgerEvent::EntryCanceled { account_id, entry_id });
    Ok(())
}

pub async fn list_pending(
    pool: &PgPool,
    account_id: AccountId,
    query: ListPendingQuery,
) -> Result<Vec<Entry>, StoreError> {
    let kind_filter = match query.filter.unwrap_or(PendingFilter::All) {
        PendingFilter::All => None,
        PendingFilter::CreditsOnly => Some(EntryKind::Credit),
        PendingFilter::DebitsOnly => Some(EntryKind::Debit),
    };

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"SELECT id, account_id, kind, amount, description, replaces,
                  is_committed, committed_by_entry_id, committed_at, created_at
           FROM entries WHERE account_id = "#,
    );
    qb.push_bind(account_id);
    qb.push(" AND is_committed = false");
    if let Some(kind) = kind_filter {
        qb.push(" AND kind = ");
        qb.push_bind(kind);
    }
    qb.push(" ORDER BY created_at ASC, id ASC");

    Ok(qb.build_query_as().fetch_all(pool).await?)
}

pub async fn enumerate(
    pool: &PgPool,
    account_id: AccountId,
    query: EntryEnumerationQuery,
) -> Result<Page<Entry>, StoreError> {
    let ordering = query.page.ordering.unwrap_or_default();
    let params = resolve_page_params(
        query.page.max_results,
        query.page.skip,
        query.page.continuation_token,
        ordering,
    )?;
    let sort_on_amount = matches!(
        ordering,
        payloads::Ordering::AmountAscending | payloads::Ordering::AmountDescending
    );
    let sort_col = if sort_on_amount { "amount" } else { "created_at" };

    let push_filters = |qb: &mut QueryBuilder<Postgres>| {
        qb.push(" AND account_id = ").push_bind(account_id);
        if !query.include_balance_entries {
            qb.push(" AND kind != 'balance'");
        }
        if let Some(kind) = query.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(is_committed) = query.is_committed {
            qb.push(" AND is_committed = ").push_bind(is_committed);
        }
        if let Some(after) = query.created_after {
            qb.push(" AND created_at > ").push_bind(SqlxTs::from(after));
        }
        if let Some(before) = query.created_before {
            qb.push(" AND created_at < ").push_bind(SqlxTs::from(before));
        }
        if let Some(min) = query.amount_min {
            qb.push(" AND amount >= ").push_bind(min);
        }
        if let Some(max) = query.amount_max {
            qb.push(" AND amount <= ").push_bind(max);
        }
    };

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT count(*) FROM entries WHERE 1 = 1");
    push_filters(&mut count_qb);
    let total_records: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let anchor = if let Some(token) = params.continuation_token {
        let row = sqlx::query_as::<_, Entry>(
            r#"SELECT id, account_id, kind, amount, description, replaces,
                      is_committed, committed_by_entry_id, committed_at, created_at
               FROM entries WHERE id = $1 AND account_id = $2"#,
        )
        .bind(token)
        .bind(account_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            StoreError::invalid("continuationToken does not match a known entry")
        })?;
        Some(row)
    } else {
        None
    };

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"SELECT id, account_id, kind, amount, description, replaces,
                  is_committed, committed_by_entry_id, committed_at, created_at
           FROM entries WHERE 1 = 1"#,
    );
    push_filters(&mut qb);
    if let Some(anchor) = &anchor {
        let cmp = if params.descending { "<" } else { ">" };
        qb.push(format!(" AND ({sort_col}, id) {cmp} ("));
        if sort_on_amount {
            qb.push_bind(anchor.amount);
        } else {
            qb.push_bind(SqlxTs::from(anchor.created_at));
        }
        qb.push(", ").push_bind(anchor.id).push(")");
    }
    qb.push(format!(
        " ORDER BY {sort_col} {dir}, id {dir}",
        dir = if params.descending { "DESC" } else { "ASC" }
    ));
    if let Some(skip) = params.skip {
        qb.push(" OFFSET ").push_bind(skip);
    }
    qb.push(" LIMIT ").push_bind(params.limit + 1);

    let mut rows: Vec<Entry> = qb.build_query_as().fetch_all(pool).await?;
    let has_more_locally = rows.len() as i64 > params.limit;
    rows.truncate(params.limit as usize);
    let last_id = rows.last().map(|e| e.id.0);

    let records_remaining = if let Some(skip) = params.skip {
        (total_records - skip - rows.len() as i64).max(0)
    } else if has_more_locally {
        if let Some(last) = rows.last() {
            let mut remaining_qb: QueryBuilder<Postgres> =
                QueryBuilder::new("SELECT count(*) FROM entries WHERE 1 = 1");
            push_filters(&mut remaining_qb);
            let cmp = if params.descending { "<" } else { ">" };
            remaining_qb.push(format!(" AND ({sort_col}, id) {cmp} ("));
            if sort_on_amount {
                remaining_qb.push_bind(last.amount);
            } else {
                remaining_qb.push_bind(SqlxTs::from(last.created_at));
            }
            remaining_qb.push(", ").push_bind(last.id).push(")");
            remaining_qb.build_query_scalar().fetch_one(pool).await?
        } else {
            0
        }
    } else {
        0
    };

    Ok(make_page(rows, total_records, records_remaining, last_id))
}
