use actix_web::{HttpRequest, delete, get, post, put, web};
use payloads::requests::{
    AppendEntries, EntryEnumerationQuery, ListPendingQuery, PendingFilter,
};
use payloads::{AccountId, Entry, EntryId};
use sqlx::PgPool;

use crate::auth::resolve_principal;
use crate::store::account_locks::AccountLockTable;
use crate::store::events::Observer;
use crate::store::{self};
use crate::time::TimeSource;
use crate::AppConfig;

use super::ApiError;

#[put("/accounts/{id}/credits")]
pub async fn append_credits(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    time_source: web::Data<TimeSource>,
    observer: web::Data<Box<dyn Observer>>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
    body: web::Json<AppendEntries>,
) -> Result<web::Json<EntriesResult>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let is_batch = body.entries.is_some();
    let entries = store::entries::append_credit(
        &pool,
        &locks,
        observer.get_ref().as_ref(),
        &time_source,
        id.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(web::Json(EntriesResult::new(entries, is_batch)))
}

#[put("/accounts/{id}/debits")]
pub async fn append_debits(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    time_source: web::Data<TimeSource>,
    observer: web::Data<Box<dyn Observer>>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
    body: web::Json<AppendEntries>,
) -> Result<web::Json<EntriesResult>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let is_batch = body.entries.is_some();
    let entries = store::entries::append_debit(
        &pool,
        &locks,
        observer.get_ref().as_ref(),
        &time_source,
        id.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(web::Json(EntriesResult::new(entries, is_batch)))
}

/// `PUT .../credits` and `.../debits` accept either a single entry or a
/// batch, and must mirror that shape back: a bare `Entry` object for a
/// single append, a JSON array for a batch (§4.2).
#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum EntriesResult {
    Single(Entry),
    Batch(Vec<Entry>),
}

impl EntriesResult {
    fn new(mut entries: Vec<Entry>, is_batch: bool) -> Self {
        if is_batch {
            EntriesResult::Batch(entries)
        } else {
            EntriesResult::Single(entries.remove(0))
        }
    }
}

#[delete("/accounts/{account_id}/entries/{entry_id}")]
pub async fn cancel_entry(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    observer: web::Data<Box<dyn Observer>>,
    app_config: web::Data<AppConfig>,
    path: web::Path<(AccountId, EntryId)>,
) -> Result<web::Json<payloads::responses::Deleted>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let (account_id, entry_id) = path.into_inner();
    store::entries::cancel(&pool, &locks, observer.get_ref().as_ref(), account_id, entry_id)
        .await?;
    Ok(web::Json(payloads::responses::Deleted { deleted: true }))
}

#[get("/accounts/{id}/entries")]
pub async fn list_entries(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<Vec<Entry>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let page = store::entries::enumerate(
        &pool,
        id.into_inner(),
        EntryEnumerationQuery {
            page: Default::default(),
            kind: None,
            is_committed: None,
            created_after: None,
            created_before: None,
            amount_min: None,
            amount_max: None,
            include_balance_entries: true,
        },
    )
    .await?;
    Ok(web::Json(page.objects))
}

#[post("/accounts/{id}/entries/enumerate")]
pub async fn enumerate_entries(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
    query: web::Json<EntryEnumerationQuery>,
) -> Result<web::Json<payloads::Page<Entry>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let page = store::entries::enumerate(&pool, id.into_inner(), query.into_inner()).await?;
    Ok(web::Json(page))
}

#[get("/accounts/{id}/entries/pending")]
pub async fn list_pending(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<Vec<Entry>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let entries = store::entries::list_pending(
        &pool,
        id.into_inner(),
        ListPendingQuery { filter: Some(PendingFilter::All) },
    )
    .await?;
    Ok(web::Json(entries))
}

#[get("/accounts/{id}/entries/pending/credits")]
pub async fn list_pending_credits(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<Vec<Entry>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let entries = store::entries::list_pending(
        &pool,
        id.into_inner(),
        ListPendingQuery { filter: Some(PendingFilter::CreditsOnly) },
    )
    .await?;
    Ok(web::Json(entries))
}

#[get("/accounts/{id}/entries/pending/debits")]
pub async fn list_pending_debits(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<Vec<Entry>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let entries = store::entries::list_pending(
        &pool,
        id.into_inner(),
        ListPendingQuery { filter: Some(PendingFilter::DebitsOnly) },
    )
    .await?;
    Ok(web::Json(entries))
}
