//! RPC bootstrap server.
//!
//! ```text
//! config (TOML) → one ServerSpec per listener → serve_with
//!                                                 │
//!     SIGINT / SIGTERM ──── fires every CancelHandle ┘
//! ```

use std::path::PathBuf;

use axum::{routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};

use rpc_bootstrap::config::{load_config, BootstrapConfig};
use rpc_bootstrap::lifecycle::signals::shutdown_signal;
use rpc_bootstrap::observability::logging::init_logging;
use rpc_bootstrap::{cancel_pair, serve_with, RpcServer, ServeOptions, ServerSpec, Version};

#[derive(Parser)]
#[command(name = "rpc-bootstrap")]
#[command(about = "Serve RPC services on every configured listener", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the TLS directory from the configuration.
    #[arg(long)]
    tls_dir: Option<PathBuf>,

    /// Override the log level from the configuration.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BootstrapConfig::default(),
    };
    if let Some(tls_dir) = cli.tls_dir {
        config.tls_dir = tls_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rpc-bootstrap starting");

    let version = config.version.clone().unwrap_or_else(package_version);
    let mut cancels = Vec::with_capacity(config.listeners.len());
    let mut specs = Vec::with_capacity(config.listeners.len());
    for listener in &config.listeners {
        let (cancel, signal) = cancel_pair();
        cancels.push(cancel);

        tracing::info!(
            name = %listener.name,
            port = listener.port,
            max_message_size = config.max_message_size_for(listener),
            "Listener configured"
        );
        specs.push(
            ServerSpec::new(listener.port)
                .with_max_message_size(config.max_message_size_for(listener))
                .with_version(version.clone())
                .with_cancel(signal)
                .register(register_health),
        );
    }

    tokio::spawn(async move {
        shutdown_signal().await;
        for cancel in cancels {
            cancel.cancel();
        }
    });

    let options = ServeOptions::new().with_tls_dir(config.tls_dir);
    serve_with(options, specs).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_health(server: &mut RpcServer) {
    let health = Router::new().route("/Check", get(health_check).post(health_check));
    server.add_service("health", health);
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "SERVING" }))
}

fn package_version() -> Version {
    let parse = |s: &str| s.parse().unwrap_or(0);
    let additional = match env!("CARGO_PKG_VERSION_PRE") {
        "" => String::new(),
        pre => format!("-{pre}"),
    };
    Version::new(
        parse(env!("CARGO_PKG_VERSION_MAJOR")),
        parse(env!("CARGO_PKG_VERSION_MINOR")),
        parse(env!("CARGO_PKG_VERSION_PATCH")),
    )
    .with_additional(additional)
}
