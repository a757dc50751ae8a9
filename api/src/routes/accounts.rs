use actix_web::{HttpRequest, delete, get, head, put, web};
use payloads::requests::{AccountEnumerationQuery, CreateAccount};
use payloads::AccountId;
use payloads::responses::Deleted;
use sqlx::PgPool;

use crate::auth::resolve_principal;
use crate::store::account_locks::AccountLockTable;
use crate::store::events::Observer;
use crate::store;
use crate::time::TimeSource;
use crate::AppConfig;

use super::ApiError;

#[put("/accounts")]
pub async fn create_account(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
    observer: web::Data<Box<dyn Observer>>,
    app_config: web::Data<AppConfig>,
    body: web::Json<CreateAccount>,
) -> Result<web::Json<payloads::Account>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let account = store::accounts::create(
        &pool,
        observer.get_ref().as_ref(),
        &time_source,
        body.into_inner(),
    )
    .await?;
    Ok(web::Json(account))
}

#[get("/accounts")]
pub async fn list_accounts(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    query: web::Query<AccountEnumerationQuery>,
) -> Result<web::Json<payloads::Page<payloads::Account>>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let page = store::accounts::enumerate(&pool, query.into_inner()).await?;
    Ok(web::Json(page))
}

#[get("/accounts/byname/{name}")]
pub async fn get_account_by_name(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    name: web::Path<String>,
) -> Result<web::Json<payloads::Account>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let account = store::accounts::get_by_name(&pool, &name).await?;
    Ok(web::Json(account))
}

#[get("/accounts/{id}")]
pub async fn get_account(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<payloads::Account>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let account = store::accounts::get_by_id(&pool, id.into_inner()).await?;
    Ok(web::Json(account))
}

#[head("/accounts/{id}")]
pub async fn account_exists(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<actix_web::HttpResponse, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    let exists = store::accounts::exists(&pool, id.into_inner()).await?;
    Ok(if exists {
        actix_web::HttpResponse::Ok().finish()
    } else {
        actix_web::HttpResponse::NotFound().finish()
    })
}

#[delete("/accounts/{id}")]
pub async fn delete_account(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    locks: web::Data<AccountLockTable>,
    observer: web::Data<Box<dyn Observer>>,
    app_config: web::Data<AppConfig>,
    id: web::Path<AccountId>,
) -> Result<web::Json<Deleted>, ApiError> {
    resolve_principal(&req, &pool, &app_config).await?;
    store::accounts::delete(&pool, &locks, observer.get_ref().as_ref(), id.into_inner()).await?;
    Ok(web::Json(Deleted { deleted: true }))
}
