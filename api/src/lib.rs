pub mod auth;
pub mod routes;
pub mod store;
pub mod telemetry;
pub mod time;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use secrecy::{ExposeSecret, SecretBox};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::store::account_locks::AccountLockTable;
use crate::store::api_keys;
use crate::store::events::{LoggingObserver, Observer};
use crate::time::TimeSource;

/// Build the server, but not await it.
///
/// Returns the port that the server has bound to by modifying the config.
pub async fn build(
    config: &mut Config,
    time_source: TimeSource,
) -> std::io::Result<Server> {
    let connect_options = config
        .store
        .connect_options()
        .unwrap_or_else(|e| panic!("invalid DATABASE_URL: {e}"));
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.store.max_pool_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.store.connection_timeout_seconds,
        ))
        .connect_with(connect_options)
        .await
        .expect("failed to connect to Postgres");

    build_with_pool(config, time_source, db_pool).await
}

/// Build the server against an already-connected pool (used by the
/// integration test harness, which manages its own per-test database).
pub async fn build_with_pool(
    config: &mut Config,
    time_source: TimeSource,
    db_pool: PgPool,
) -> std::io::Result<Server> {
    if config.auth.default_admin_key.is_some() {
        bootstrap_admin_key(&db_pool, &time_source, &config.auth).await;
    }

    let db_pool = web::Data::new(db_pool);
    let time_source = web::Data::new(time_source);
    let locks = web::Data::new(AccountLockTable::new());
    let observer: web::Data<Box<dyn Observer>> = web::Data::new(Box::new(LoggingObserver));

    let allowed_origins = config.allowed_origins.clone();
    let app_config = web::Data::new(AppConfig {
        auth_enabled: config.auth.enabled,
    });

    let listener = TcpListener::bind(format!("{}:{}", config.ip, config.port))?;
    config.port = listener.local_addr()?.port();
    let server = HttpServer::new(move || {
        let cors = if allowed_origins.contains(&"*".to_string()) {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
        } else {
            let mut cors = Cors::default().allow_any_method().allow_any_header();
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        };

        App::new()
            .wrap(cors)
            .wrap(SecurityHeadersMiddleware)
            .wrap(CorrelationIdMiddleware)
            .service(routes::api_services())
            .app_data(db_pool.clone())
            .app_data(time_source.clone())
            .app_data(locks.clone())
            .app_data(observer.clone())
            .app_data(app_config.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

/// Ensure the configured bootstrap admin token exists on startup, so a
/// freshly deployed instance always has one working admin credential
/// (§6). A no-op if a key with that exact token is already present.
async fn bootstrap_admin_key(
    pool: &PgPool,
    time_source: &TimeSource,
    auth: &AuthConfig,
) {
    let Some(token) = &auth.default_admin_key else { return };
    let token_hash = api_keys::hash_token(token.expose_secret());
    let existing: Option<(payloads::ApiKeyId,)> =
        sqlx::query_as("SELECT id FROM api_keys WHERE token_hash = $1")
            .bind(&token_hash)
            .fetch_optional(pool)
            .await
            .expect("failed to query api_keys during bootstrap");
    if existing.is_some() {
        return;
    }
    let id = payloads::ApiKeyId(uuid::Uuid::new_v4());
    let now = time_source.now();
    sqlx::query(
        r#"
        INSERT INTO api_keys (id, label, token_hash, is_admin, created_at, revoked_at)
        VALUES ($1, 'bootstrap admin key', $2, true, $3, NULL)
        "#,
    )
    .bind(id)
    .bind(&token_hash)
    .bind(jiff_sqlx::Timestamp::from(now))
    .execute(pool)
    .await
    .expect("failed to insert bootstrap admin key");
    tracing::info!("bootstrap admin api key installed");
}

/// Store connection settings (§6).
pub struct StoreConfig {
    pub database_url: String,
    pub connection_timeout_seconds: u64,
    pub max_pool_size: u32,
    pub log_queries: bool,
}

impl StoreConfig {
    fn connect_options(
        &self,
    ) -> Result<sqlx::postgres::PgConnectOptions, sqlx::Error> {
        use std::str::FromStr;
        let mut options = sqlx::postgres::PgConnectOptions::from_str(&self.database_url)?;
        if !self.log_queries {
            options = options.disable_statement_logging();
        }
        Ok(options)
    }
}

/// Bearer-token authentication settings (§4.6, §6).
pub struct AuthConfig {
    pub enabled: bool,
    pub default_admin_key: Option<SecretBox<String>>,
}

/// Configuration loaded from environment variables at startup.
pub struct Config {
    pub store: StoreConfig,
    pub auth: AuthConfig,
    /// set to "0.0.0.0" for public access, "127.0.0.1" for local dev
    pub ip: String,
    /// set to 0 to get an os-assigned port
    pub port: u16,
    /// List of allowed CORS origins. Use "*" to allow any origin (development only)
    pub allowed_origins: Vec<String>,
}

/// Runtime configuration shared across the application as app_data.
pub struct AppConfig {
    pub auth_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        use std::env::var;

        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Config {
            store: StoreConfig {
                database_url: var("DATABASE_URL").unwrap(),
                connection_timeout_seconds: var("STORE_CONNECTION_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
                max_pool_size: var("STORE_MAX_POOL_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
                log_queries: var("STORE_LOG_QUERIES")
                    .map(|v| v == "true")
                    .unwrap_or(false),
            },
            auth: AuthConfig {
                enabled: var("AUTH_ENABLED").map(|v| v != "false").unwrap_or(true),
                default_admin_key: var("AUTH_DEFAULT_ADMIN_KEY")
                    .ok()
                    .map(|k| SecretBox::new(Box::new(k))),
            },
            ip: var("IP_ADDRESS").unwrap(),
            port: var("PORT").unwrap().parse().unwrap(),
            allowed_origins,
        }
    }
}

/// Middleware to add security headers and a request-scoped correlation id
/// to every response.
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{CACHE_CONTROL, EXPIRES, HeaderName, HeaderValue, PRAGMA},
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
};

type LocalBoxFuture<T> = Pin<Box<dyn std::future::Future<Output = T>>>;

pub struct SecurityHeadersMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SecurityHeadersMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>
        + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SecurityHeadersMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct SecurityHeadersMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>
        + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let is_api_endpoint = req.path().starts_with("/v1");

            let res = service.call(req).await?;

            if is_api_endpoint {
                let (req, mut res) = res.into_parts();

                res.headers_mut().insert(
                    CACHE_CONTROL,
                    HeaderValue::from_static(
                        "no-store, no-cache, must-revalidate, private",
                    ),
                );
                res.headers_mut()
                    .insert(PRAGMA, HeaderValue::from_static("no-cache"));
                res.headers_mut()
                    .insert(EXPIRES, HeaderValue::from_static("0"));

                Ok(ServiceResponse::new(req, res))
            } else {
                Ok(res)
            }
        })
    }
}

/// Stamps every response with an `X-Correlation-Id` header, echoing one
/// supplied by the caller or minting a fresh UUID otherwise (§6). The same
/// id is recorded on the request's tracing span by `routes::api_services`.
pub struct CorrelationIdMiddleware;

static CORRELATION_ID_HEADER: &str = "x-correlation-id";

impl<S, B> Transform<S, ServiceRequest> for CorrelationIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>
        + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = CorrelationIdMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationIdMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct CorrelationIdMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CorrelationIdMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>
        + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header_name = HeaderName::from_static(CORRELATION_ID_HEADER);
        let incoming = req
            .headers()
            .get(&header_name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let correlation_id = incoming.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;
            let (req, mut res) = res.into_parts();
            if let Ok(value) = HeaderValue::from_str(&correlation_id) {
                res.headers_mut().insert(header_name, value);
            }
            Ok(ServiceResponse::new(req, res))
        })
    }
}
