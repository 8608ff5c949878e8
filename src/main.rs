//! flowhost binary: load configuration, assemble the host, serve until a
//! termination signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use flowhost::bundle::discover_bundles;
use flowhost::config::load_config;
use flowhost::lifecycle::signals;
use flowhost::observability::{logging, metrics};
use flowhost::{HostCollaborators, Shutdown, WebHost};

#[derive(Parser)]
#[command(name = "flowhost", version, about = "Web application host for plugin-supplied UIs")]
struct Args {
    /// Path to the host configuration file.
    #[arg(long, short, default_value = "flowhost.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => startup_failure(&e),
    };

    logging::init_tracing(&config.observability.log_level);
    tracing::info!(
        config = %args.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "flowhost starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bundles = match discover_bundles(&config.extensions.directory) {
        Ok(bundles) => bundles,
        Err(e) => startup_failure(&e),
    };
    tracing::info!(count = bundles.len(), "Discovered plugin bundles");

    let collaborators = HostCollaborators::basic(&config);
    let host = Arc::new(WebHost::new(config, collaborators));

    if let Err(e) = host.init() {
        startup_failure(&e);
    }
    if let Err(e) = host.clone().start(bundles) {
        startup_failure(&e);
    }

    let shutdown = Shutdown::new();
    signals::trigger_on_signal(&shutdown);
    shutdown.triggered().await;

    host.stop();
    tracing::info!("Shutdown complete");
}

/// Fatal abort path: short diagnostic to the error stream and the log,
/// then a non-zero exit.
fn startup_failure(error: &dyn std::fmt::Display) -> ! {
    tracing::error!(%error, "Failed to start web server... shutting down");
    eprintln!("Failed to start web server: {error}");
    eprintln!("Shutting down...");
    std::process::exit(1);
}
