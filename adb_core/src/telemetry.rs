// ABOUTME: Global tracing subscriber setup for the antidb binaries.
// ABOUTME: Logs go to stderr so command output on stdout stays machine-readable.
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Filter used when `RUST_LOG` is unset: info for our crates, warn for dependencies
pub const DEFAULT_FILTER: &str = "warn,app=info,adb_core=info,adb_db=info,adb_storage=info";

pub fn is_production(env: &str) -> bool {
    env.eq_ignore_ascii_case("production")
}

/// Install the subscriber; later calls are no-ops
pub fn init_tracing(env: &str, service: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        if is_production(env) {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .with(env_filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .with(env_filter)
                .init();
        }

        tracing::debug!(service = %service, env = %env, "Tracing initialized");
    });
}
