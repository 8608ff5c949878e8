//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured
/// level when set.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("flowhost={log_level},tower_http=warn").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
