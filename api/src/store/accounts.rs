//! AccountRegistry (§4.1): create, look up, delete, and enumerate accounts.

use jiff_sqlx::Timestamp as SqlxTs;
use payloads::{Account, AccountId, Page};
use payloads::requests::{AccountEnumerationQuery, CreateAccount, ACCOUNT_NAME_MAX_LEN};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::account_locks::AccountLockTable;
use super::enumerate::{make_page, resolve_page_params};
use super::events::{LedgerEvent, Observer};
use super::StoreError;
use crate::time::TimeSource;

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::invalid("account name must not be empty"));
    }
    if name.len() > ACCOUNT_NAME_MAX_LEN {
        return Err(StoreError::invalid(format!(
            "account name must be at most {ACCOUNT_NAME_MAX_LEN} bytes"
        )));
    }
    Ok(())
}

/// Create an account, optionally seeding a genesis Balance entry (§4.1,
/// §4.3.1). The genesis entry references itself as
/// `committed_by_entry_id` since it is committed the instant it exists.
pub async fn create(
    pool: &PgPool,
    observer: &dyn Observer,
    time_source: &TimeSource,
    req: CreateAccount,
) -> Result<Account, StoreError> {
    validate_name(&req.name)?;
    if let Some(amount) = req.initial_balance {
        if amount.is_sign_negative() {
            return Err(StoreError::invalid("initialBalance must not be negative"));
        }
    }

    let mut tx = pool.begin().await?;
    let id = AccountId(Uuid::new_v4());
    let now = time_source.now();

    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, name, notes, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, notes, created_at
        "#,
    )
    .bind(id)
    .bind(&req.name)
    .bind(&req.notes)
    .bind(SqlxTs::from(now))
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::AccountNameConflict(req.name.clone())
        }
        _ => StoreError::Database(err),
    })?;

    if let Some(amount) = req.initial_balance.filter(|a| !a.is_zero()) {
        let genesis_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO entries
                (id, account_id, kind, amount, description, replaces,
                 is_committed, committed_by_entry_id, committed_at, created_at)
            VALUES ($1, $2, 'balance', $3, NULL, NULL, true, $1, $4, $4)
            "#,
        )
        .bind(genesis_id)
        .bind(id)
        .bind(amount)
        .bind(SqlxTs::from(now))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    observer.notify(&LedgerEvent::AccountCreated { account_id: id });
    Ok(account)
}

pub async fn get_by_id(pool: &PgPool, id: AccountId) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(
        "SELECT id, name, notes, created_at FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::AccountNotFound)
}

pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Account, StoreError> {
    sqlx::query_as::<_, Account>(
        "SELECT id, name, notes, created_at FROM accounts WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::AccountNotFound)
}

pub async fn exists(pool: &PgPool, id: AccountId) -> Result<bool, StoreError> {
    let found: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Delete an account and its entire entry history (§4.1). Holds the
/// account's lock for the duration so a concurrent Commit or Append cannot
/// observe a half-deleted account.
pub async fn delete(
    pool: &PgPool,
    locks: &AccountLockTable,
    observer: &dyn Observer,
    id: AccountId,
) -> Result<(), StoreError> {
    let _guard = locks.lock(id).await;
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM entries WHERE account_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::AccountNotFound);
    }

    tx.commit().await?;
    observer.notify(&LedgerEvent::AccountDeleted { account_id: id });
    locks.prune(id);
    Ok(())
}

pub async fn enumerate(
    pool: &PgPool,
    query: AccountEnumerationQuery,
) -> Result<Page<Account>, StoreError> {
    let ordering = query.page.ordering.unwrap_or_default();
    let params = resolve_page_params(
        query.page.max_results,
        query.page.skip,
        query.page.continuation_token,
        ordering,
    )?;

    let name_filter = query.name_contains.as_deref().filter(|s| !s.is_empty());

    let mut count_qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT count(*) FROM accounts WHERE 1 = 1");
    if let Some(name) = name_filter {
        count_qb.push(" AND name ILIKE ");
        count_qb.push_bind(format!("%{name}%"));
    }
    let total_records: i64 = count_qb
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let anchor_created_at = if let Some(token) = params.continuation_token {
        let row: Option<(SqlxTs,)> =
            sqlx::query_as("SELECT created_at FROM accounts WHERE id = $1")
                .bind(token)
                .fetch_optional(pool)
                .await?;
        Some(
            row.ok_or_else(|| StoreError::invalid("continuationToken does not match a known account"))?
                .0,
        )
    } else {
        None
    };

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, name, notes, created_at FROM accounts WHERE 1 = 1");
    if let Some(name) = name_filter {
        qb.push(" AND name ILIKE ");
        qb.push_bind(format!("%{name}%"));
    }
    if let Some(anchor) = anchor_created_at {
        if params.descending {
            qb.push(" AND (created_at, id) < (");
        } else {
            qb.push(" AND (created_at, id) > (");
        }
        qb.push_bind(anchor);
        qb.push(", ");
        qb.push_bind(params.continuation_token.unwrap());
        qb.push(")");
    }
    qb.push(if params.descending {
        " ORDER BY created_at DESC, id DESC"
    } else {
        " ORDER BY created_at ASC, id ASC"
    });
    if let Some(skip) = params.skip {
        qb.push(" OFFSET ").push_bind(skip);
    }
    qb.push(" LIMIT ").push_bind(params.limit + 1);

    let mut rows: Vec<Account> = qb.build_query_as().fetch_all(pool).await?;
    let has_more_locally = rows.len() as i64 > params.limit;
    rows.truncate(params.limit as usize);
    let last_id = rows.last().map(|a| a.id.0);

    let records_remaining = if let Some(skip) = params.skip {
        (total_records - skip - rows.len() as i64).max(0)
    } else if has_more_locally {
        // Exact count of everything after this page, recomputed with the
        // same keyset predicate so it is correct even under concurrent
        // inserts (§4.5).
        if let Some(last) = rows.last() {
            let mut remaining_qb: QueryBuilder<Postgres> =
                QueryBuilder::new("SELECT count(*) FROM accounts WHERE 1 = 1");
            if let Some(name) = name_filter {
                remaining_qb.push(" AND name ILIKE ");
                remaining_qb.push_bind(format!("%{name}%"));
            }
            if params.descending {
                remaining_qb.push(" AND (created_at, id) < (");
            } else {
                remaining_qb.push(" AND (created_at, id) > (");
            }
            remaining_qb.push_bind(SqlxTs::from(last.created_at));
            remaining_qb.push(", ");
            remaining_qb.push_bind(last.id.0);
            remaining_qb.push(")");
            remaining_qb.build_query_scalar().fetch_one(pool).await?
        } else {
            0
        }
    } else {
        0
    };

    Ok(make_page(rows, total_records, records_remaining, last_id))
}
