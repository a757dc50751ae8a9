//! Structured logging setup (`tracing`), shared between the server binary
//! and the integration test harness.

use tracing::level_filters::LevelFilter;
use tracing::subscriber::Subscriber;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

/// Build a subscriber that logs to stdout, honoring `RUST_LOG` if set and
/// otherwise falling back to `default_level`.
pub fn get_subscriber(default_level: String) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let formatting_layer = tracing_subscriber::fmt::layer().with_target(true);
    Registry::default()
        .with(LevelFilter::TRACE)
        .with(env_filter)
        .with(formatting_layer)
}

/// Register a subscriber as the global default, redirecting the `log`
/// facade (used by some dependencies) into `tracing` as well.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    tracing_log::LogTracer::init()
        .expect("Failed to set logger for the `log` crate");
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
