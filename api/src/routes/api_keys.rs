use actix_web::{HttpRequest, delete, get, put, web};
use payloads::requests::CreateApiKey;
use payloads::responses::ApiKeyRevoked;
use payloads::{ApiKeyCreated, ApiKeyId, ApiKeySummary};
use sqlx::PgPool;

use crate::auth::resolve_principal;
use crate::store;
use crate::time::TimeSource;
use crate::AppConfig;

use super::ApiError;

#[get("/apikeys")]
pub async fn list_api_keys(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    app_config: web::Data<AppConfig>,
) -> Result<web::Json<Vec<ApiKeySummary>>, ApiError> {
    let principal = resolve_principal(&req, &pool, &app_config).await?;
    principal.require_admin()?;
    let keys = store::api_keys::list(&pool).await?;
    Ok(web::Json(keys))
}

#[put("/apikeys")]
pub async fn create_api_key(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
    app_config: web::Data<AppConfig>,
    body: web::Json<CreateApiKey>,
) -> Result<web::Json<ApiKeyCreated>, ApiError> {
    let principal = resolve_principal(&req, &pool, &app_config).await?;
    principal.require_admin()?;
    let created = store::api_keys::create(&pool, &time_source, body.into_inner()).await?;
    Ok(web::Json(created))
}

#[delete("/apikeys/{id}")]
pub async fn revoke_api_key(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    time_source: web::Data<TimeSource>,
    app_config: web::Data<AppConfig>,
    id: web::Path<ApiKeyId>,
) -> Result<web::Json<ApiKeyRevoked>, ApiError> {
    let principal = resolve_principal(&req, &pool, &app_config).await?;
    principal.require_admin()?;
    let id = id.into_inner();
    store::api_keys::revoke(&pool, &time_source, id).await?;
    Ok(web::Json(ApiKeyRevoked { id, revoked: true }))
}
