//! Conditional proxy gate (v1)
//!
//! ```text
//!   Client ──▶ gate ──(prefix match)──▶ upstream dev server
//!                │                          │
//!                │◀──────── 404 ────────────┘
//!                ▼
//!          fallback handler (static files)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use conditional_proxy::config::{self, validate_config, ConfigError, GateConfig};
use conditional_proxy::lifecycle::{signals, Shutdown};
use conditional_proxy::observability::{logging, metrics};
use conditional_proxy::GateServer;

#[derive(Parser)]
#[command(name = "conditional-proxy")]
#[command(about = "Proxy to an upstream, falling back to local files on 404", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Path prefix eligible for proxying.
    #[arg(long)]
    prefix: Option<String>,

    /// Upstream base address, e.g. http://127.0.0.1:5173.
    #[arg(long)]
    upstream: Option<String>,

    /// Directory served when the upstream answers 404.
    #[arg(long)]
    static_dir: Option<String>,

    /// Per-request upstream timeout in seconds.
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl Cli {
    fn apply(self, config: &mut GateConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(prefix) = self.prefix {
            config.proxy.path_prefix = prefix;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.url = upstream;
        }
        if let Some(dir) = self.static_dir {
            config.fallback.static_dir = Some(dir);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.proxy.request_timeout_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::read_config(path)?,
        None => GateConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;
    tracing::info!("conditional-proxy v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        path_prefix = %config.proxy.path_prefix,
        upstream = %config.upstream.url,
        request_timeout_secs = config.proxy.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let target = config.target_source()?.into_resolution();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = GateServer::new(&config, target, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
