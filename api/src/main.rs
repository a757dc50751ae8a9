use api::{
    Config, build,
    telemetry::{get_subscriber, init_subscriber},
    time::TimeSource,
};

/// Ledger API Server
///
/// Environment variables can be set directly or loaded from a .env file in
/// the project root.
///
/// Required:
/// - DATABASE_URL: PostgreSQL connection string
/// - IP_ADDRESS: server bind address (127.0.0.1 for local, 0.0.0.0 for public)
/// - PORT: server port (0 for an OS-assigned port)
///
/// Optional:
/// - ALLOWED_ORIGINS: CORS origins ("*" for any origin, or a comma-separated list)
/// - STORE_CONNECTION_TIMEOUT_SECONDS, STORE_MAX_POOL_SIZE, STORE_LOG_QUERIES
/// - AUTH_ENABLED (default true), AUTH_DEFAULT_ADMIN_KEY (bootstrap admin token)
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber);

    let mut config = Config::from_env();

    let pool = sqlx::PgPool::connect(&config.store.database_url).await.unwrap();
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run database migrations");
    pool.close().await;

    #[cfg(not(feature = "mock-time"))]
    let time_source = TimeSource::new();
    #[cfg(feature = "mock-time")]
    let time_source = TimeSource::new(jiff::Timestamp::now());

    let server = build(&mut config, time_source).await?;
    server.await
}
