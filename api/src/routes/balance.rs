use actix_web::{HttpRequest, get, post, web};
use payloads::requests::{BalanceAsOfQuery, Commit, EnumerationQuery};
use payloads::{AccountId, BalanceAsOf, BalanceView, VerifyResult};
use sqlx::PgPool;

use crate::auth::resolve_principal;
use crate::store::account_locks::AccountLockTable;
use crate::store::events::Observer;
use crate::store::{self};
use crate::time::TimeSource;
use crate::AppConfig;

use super::ApiError;

#[get("/accounts/{id}/balance")]
pub async fn get_balance(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<BalanceView>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let view = store::balance::get_balance(&pool, &locks, id.into_inner()).await?;
    Ok(web::Json(view))
}

#[get("/accounts/{id}/balance/asof")]
pub async fn get_balance_as_of(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
    query: web::Query<BalanceAsOfQuery>,
) -> Result<web::Json<BalanceAsOf>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let result =
        store::balance::get_balance_as_of(&pool, id.into_inner(), query.into_inner()).await?;
    Ok(web::Json(result))
}

#[get("/balances")]
pub async fn get_all_balances(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    app_config: web::Data<AppConfig>,
    query: web::Query<EnumerationQuery>,
) -> Result<web::Json<Vec<BalanceView>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let page = store::balance::get_all(&pool, &locks, query.into_inner()).await?;
    Ok(web::Json(page.objects))
}

#[post("/accounts/{id}/commit")]
pub async fn commit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    time_source: web::Data<TimeSource>,
    observer: web::Data<Box<dyn Observer>>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
    body: web::Json<Commit>,
) -> Result<web::Json<BalanceView>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let account_id = id.into_inner();
    store::balance::commit(
        &pool,
        &locks,
        observer.get_ref().as_ref(),
        &time_source,
        account_id,
        body.into_inner(),
    )
    .await?;
    let view = store::balance::get_balance(&pool, &locks, account_id).await?;
    Ok(web::Json(view))
}

#[get("/accounts/{id}/verify")]
pub async fn verify(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<VerifyResult>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let result = store::balance::verify(&pool, id.into_inner()).await?;
    Ok(web::Json(result))
}
