//! BalanceEngine (§4.3): the commit algorithm, balance queries, and chain
//! verification. This is the subsystem every other invariant in the spec
//! ultimately rests on.

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTs;
use payloads::requests::{BalanceAsOfQuery, Commit, EnumerationQuery};
use payloads::{
    AccountId, BalanceAsOf, BalanceView, Entry, EntryId, EntryKind, EntrySummary, Page,
    VerifyResult,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use super::account_locks::AccountLockTable;
use super::accounts;
use super::events::{LedgerEvent, Observer};
use super::StoreError;
use crate::time::TimeSource;

async fn latest_balance_entry(
    pool: &PgPool,
    account_id: AccountId,
) -> Result<Option<Entry>, StoreError> {
    Ok(sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, kind, amount, description, replaces,
               is_committed, committed_by_entry_id, committed_at, created_at
        FROM entries
        WHERE account_id = $1 AND kind = 'balance'
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?)
}

async fn pending_entries(
    pool: &PgPool,
    account_id: AccountId,
    kind: EntryKind,
) -> Result<Vec<Entry>, StoreError> {
    Ok(sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, kind, amount, description, replaces,
               is_committed, committed_by_entry_id, committed_at, created_at
        FROM entries
        WHERE account_id = $1 AND kind = $2 AND is_committed = false
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(account_id)
    .bind(kind)
    .fetch_all(pool)
    .await?)
}

fn summarize(entries: Vec<Entry>) -> EntrySummary {
    let total_amount = entries.iter().fold(Decimal::ZERO, |acc, e| acc + e.amount);
    EntrySummary {
        count: entries.len(),
        total_amount,
        entries,
    }
}

/// Read the account's current balance view under its per-account lock
/// (§4.3.1, §5): the Balance snapshot and the pending-entry summaries it's
/// composed from must be read as one consistent unit, not torn apart by a
/// concurrent commit.
pub async fn get_balance(
    pool: &PgPool,
    locks: &AccountLockTable,
    account_id: AccountId,
) -> Result<BalanceView, StoreError> {
    let _guard = locks.lock(account_id).await;

    let account = accounts::get_by_id(pool, account_id).await?;
    let latest = latest_balance_entry(pool, account_id).await?;
    let committed_balance = latest.as_ref().map(|e| e.amount).unwrap_or(Decimal::ZERO);

    let pending_credits = summarize(pending_entries(pool, account_id, EntryKind::Credit).await?);
    let pending_debits = summarize(pending_entries(pool, account_id, EntryKind::Debit).await?);
    let pending_balance =
        committed_balance + pending_credits.total_amount - pending_debits.total_amount;

    // Only the entries folded into the *latest* Balance entry, not every
    // committed entry in the account's history (§4.3.1).
    let committed_entry_ids: Vec<EntryId> = match latest.as_ref() {
        Some(latest) => {
            sqlx::query_scalar(
                "SELECT id FROM entries WHERE committed_by_entry_id = $1 AND kind != 'balance' ORDER BY created_at ASC, id ASC",
            )
            .bind(latest.id)
            .fetch_all(pool)
            .await?
        }
        None => Vec::new(),
    };

    Ok(BalanceView {
        account_id,
        name: account.name,
        created_at: account.created_at,
        latest_balance_entry_id: latest.as_ref().map(|e| e.id),
        balance_timestamp: latest.as_ref().map(|e| e.created_at),
        committed_balance,
        pending_balance,
        pending_credits,
        pending_debits,
        committed_entry_ids,
    })
}

/// Reconstruct the committed balance as of a past instant (§4.3, Open
/// Questions): the amount carried by the latest Balance entry created at
/// or before `as_of`, or zero if the account had no Balance entry yet at
/// that instant.
pub async fn get_balance_as_of(
    pool: &PgPool,
    account_id: AccountId,
    query: BalanceAsOfQuery,
) -> Result<BalanceAsOf, StoreError> {
    accounts::get_by_id(pool, account_id).await?;
    let amount: Option<Decimal> = sqlx::query_scalar(
        r#"
        SELECT amount FROM entries
        WHERE account_id = $1 AND kind = 'balance' AND created_at <= $2
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .bind(SqlxTs::from(query.as_of))
    .fetch_optional(pool)
    .await?;

    Ok(BalanceAsOf {
        account_id,
        as_of: query.as_of,
        amount: amount.unwrap_or(Decimal::ZERO),
    })
}

pub async fn get_all(
    pool: &PgPool,
    locks: &AccountLockTable,
    query: EnumerationQuery,
) -> Result<Page<BalanceView>, StoreError> {
    let page = accounts::enumerate(
        pool,
        payloads::requests::AccountEnumerationQuery {
            page: query,
            name_contains: None,
        },
    )
    .await?;
    let mut views = Vec::with_capacity(page.objects.len());
    for account in page.objects {
        views.push(get_balance(pool, locks, account.id).await?);
    }
    Ok(Page {
        total_records: page.total_records,
        objects: views,
        records_remaining: page.records_remaining,
        end_of_results: page.end_of_results,
        continuation_token: page.continuation_token,
    })
}

/// Resolve which pending entries a `Commit` call should fold into the next
/// Balance entry (§4.3.2): either every pending Credit/Debit, or a
/// caller-named explicit set. An explicit set referencing an unknown,
/// already-committed, or wrong-account entry id is an error.
async fn resolve_selection(
    tx: &mut Transaction<'_, Postgres>,
    account_id: AccountId,
    req: &Commit,
) -> Result<Vec<Entry>, StoreError> {
    match &req.entry_guids {
        None => {
            Ok(sqlx::query_as::<_, Entry>(
                r#"
                SELECT id, account_id, kind, amount, description, replaces,
                       is_committed, committed_by_entry_id, committed_at, created_at
                FROM entries
                WHERE account_id = $1 AND kind != 'balance' AND is_committed = false
                ORDER BY created_at ASC, id ASC
                FOR UPDATE
                "#,
            )
            .bind(account_id)
            .fetch_all(&mut **tx)
            .await?)
        }
        Some(ids) => {
            if ids.is_empty() {
                return Err(StoreError::invalid("entryGuids must not be empty"));
            }
            let mut selected = Vec::with_capacity(ids.len());
            for id in ids {
                let entry = sqlx::query_as::<_, Entry>(
                    r#"
                    SELECT id, account_id, kind, amount, description, replaces,
                           is_committed, committed_by_entry_id, committed_at, created_at
                    FROM entries WHERE id = $1
                    FOR UPDATE
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or(StoreError::EntryNotFound)?;
                if entry.account_id != account_id {
                    return Err(StoreError::invalid(format!(
                        "entry {id} does not belong to this account"
                    )));
                }
                if entry.kind == EntryKind::Balance {
                    return Err(StoreError::invalid(format!(
                        "entry {id} is a Balance entry and cannot be committed"
                    )));
                }
                if entry.is_committed {
                    return Err(StoreError::conflict(format!(
                        "entry {id} is already committed"
                    )));
                }
                selected.push(entry);
            }
            Ok(selected)
        }
    }
}

/// Fold the selected pending entries into a new Balance entry (§4.3.2).
/// An explicit empty `entryGuids` is rejected by `resolve_selection` before
/// reaching here; a `None` selection (all pending) that resolves to nothing
/// pending is a legal no-op and creates no new Balance entry (§4.3.2 step 4,
/// testable property #6) — `None` is returned in that case.
pub async fn commit(
    pool: &PgPool,
    locks: &AccountLockTable,
    observer: &dyn Observer,
    time_source: &TimeSource,
    account_id: AccountId,
    req: Commit,
) -> Result<Option<Entry>, StoreError> {
    let _guard = locks.lock(account_id).await;
    accounts::get_by_id(pool, account_id).await?;

    let mut tx = pool.begin().await?;
    let prior = latest_balance_entry(pool, account_id).await?;
    let prior_amount = prior.as_ref().map(|e| e.amount).unwrap_or(Decimal::ZERO);
    let prior_id = prior.as_ref().map(|e| e.id);

    let selected = resolve_selection(&mut tx, account_id, &req).await?;
    if selected.is_empty() {
        tx.rollback().await?;
        return Ok(None);
    }

    let credits: Decimal = selected
        .iter()
        .filter(|e| e.kind == EntryKind::Credit)
        .fold(Decimal::ZERO, |acc, e| acc + e.amount);
    let debits: Decimal = selected
        .iter()
        .filter(|e| e.kind == EntryKind::Debit)
        .fold(Decimal::ZERO, |acc, e| acc + e.amount);
    let new_amount = prior_amount + credits - debits;

    let now = time_source.now();
    let balance_entry = insert_balance_entry(&mut tx, account_id, new_amount, prior_id, now).await?;

    for entry in &selected {
        sqlx::query(
            "UPDATE entries SET is_committed = true, committed_by_entry_id = $1, committed_at = $2 WHERE id = $3",
        )
        .bind(balance_entry.id)
        .bind(SqlxTs::from(now))
        .bind(entry.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    observer.notify(&LedgerEvent::Committed {
        account_id,
        balance_entry_id: balance_entry.id,
    });
    Ok(Some(balance_entry))
}

async fn insert_balance_entry(
    tx: &mut Transaction<'_, Postgres>,
    account_id: AccountId,
    amount: Decimal,
    replaces: Option<EntryId>,
    now: Timestamp,
) -> Result<Entry, StoreError> {
    let id = EntryId(uuid::Uuid::new_v4());
    Ok(sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries
            (id, account_id, kind, amount, description, replaces,
             is_committed, committed_by_entry_id, committed_at, created_at)
        VALUES ($1, $2, 'balance', $3, NULL, $4, true, $1, $5, $5)
        RETURNING id, account_id, kind, amount, description, replaces,
                  is_committed, committed_by_entry_id, committed_at, created_at
        "#,
    )
    .bind(id)
    .bind(account_id)
    .bind(amount)
    .bind(replaces)
    .bind(SqlxTs::from(now))
    .fetch_one(&mut **tx)
    .await?)
}

/// Walk the Balance chain in creation order and check that each entry's
/// `replaces` link and arithmetic are consistent with the one before it
/// (§4.3.3).
pub async fn verify(pool: &PgPool, account_id: AccountId) -> Result<VerifyResult, StoreError> {
    accounts::get_by_id(pool, account_id).await?;

    let balances = sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, account_id, kind, amount, description, replaces,
               is_committed, committed_by_entry_id, committed_at, created_at
        FROM entries
        WHERE account_id = $1 AND kind = 'balance'
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    let mut prev: Option<&Entry> = None;
    for balance in &balances {
        let prev_amount = prev.map(|p| p.amount).unwrap_or(Decimal::ZERO);
        let expected_replaces = prev.map(|p| p.id);
        if balance.replaces != expected_replaces {
            return Ok(VerifyResult { account_id, valid: false });
        }

        let credits: Decimal = sqlx::query_scalar(
            "SELECT coalesce(sum(amount), 0) FROM entries WHERE committed_by_entry_id = $1 AND kind = 'credit'",
        )
        .bind(balance.id)
        .fetch_one(pool)
        .await?;
        let debits: Decimal = sqlx::query_scalar(
            "SELECT coalesce(sum(amount), 0) FROM entries WHERE committed_by_entry_id = $1 AND kind = 'debit'",
        )
        .bind(balance.id)
        .fetch_one(pool)
        .await?;

        if balance.amount != prev_amount + credits - debits {
            return Ok(VerifyResult { account_id, valid: false });
        }
        prev = Some(balance);
    }

    Ok(VerifyResult { account_id, valid: true })
}
