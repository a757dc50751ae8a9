pub mod accounts;
pub mod api_keys;
pub mod balance;
pub mod entries;

use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, head, web,
};
use payloads::ServiceInfo;

use crate::store::StoreError;

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("")
        .service(service_info)
        .service(health_check)
        .service(
            web::scope("/v1")
                .service(accounts::create_account)
                .service(accounts::list_accounts)
                .service(accounts::get_account_by_name)
                .service(accounts::get_account)
                .service(accounts::account_exists)
                .service(accounts::delete_account)
                .service(entries::append_credits)
                .service(entries::append_debits)
                .service(entries::cancel_entry)
                .service(entries::list_entries)
                .service(entries::enumerate_entries)
                .service(entries::list_pending_credits)
                .service(entries::list_pending_debits)
                .service(entries::list_pending)
                .service(balance::get_balance_as_of)
                .service(balance::get_balance)
                .service(balance::get_all_balances)
                .service(balance::commit)
                .service(balance::verify)
                .service(api_keys::list_api_keys)
                .service(api_keys::create_api_key)
                .service(api_keys::revoke_api_key),
        )
}

#[get("/")]
pub async fn service_info() -> impl Responder {
    web::Json(ServiceInfo {
        name: "ledger-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[head("/")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

/// HTTP-facing error, mapped from `StoreError` once at the routes boundary
/// (§7). Never forwards a raw `sqlx::Error`'s `Display` text to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            ApiError::Unauthorized => {
                HttpResponse::Unauthorized().json(ErrorBody::new(self))
            }
            ApiError::Forbidden => {
                HttpResponse::Forbidden().json(ErrorBody::new(self))
            }
            ApiError::NotFound => {
                HttpResponse::NotFound().json(ErrorBody::new(self))
            }
            ApiError::BadRequest(_) => {
                HttpResponse::BadRequest().json(ErrorBody::new(self))
            }
            ApiError::Conflict(_) => {
                HttpResponse::Conflict().json(ErrorBody::new(self))
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "unexpected error");
                HttpResponse::InternalServerError().json(ErrorBody::new(self))
            }
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorBody {
    fn new(err: &ApiError) -> Self {
        Self { error: err.to_string() }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound => ApiError::NotFound,
            StoreError::EntryNotFound => ApiError::NotFound,
            StoreError::ApiKeyNotFound => ApiError::NotFound,
            StoreError::Unauthorized => ApiError::Unauthorized,
            StoreError::Forbidden => ApiError::Forbidden,
            StoreError::AccountNameConflict(_) => ApiError::Conflict(err.to_string()),
            StoreError::Conflict(_) => ApiError::Conflict(err.to_string()),
            StoreError::Invalid(_) => ApiError::BadRequest(err.to_string()),
            StoreError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}
