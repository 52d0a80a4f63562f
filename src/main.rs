//! Yandex Cloud resource provider
//!
//! Entry point. Loads the provider configuration, opens the state file and
//! runs one apply, refresh, destroy or validate pass.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yc_resource_provider::{
    apply::{self, Manifest, Report},
    config::ProviderConfig,
    metrics,
    reconcilers::Context,
    state::StateStore,
};

#[derive(Parser)]
#[command(name = "yc-resource-provider", version, about)]
struct Cli {
    /// Provider configuration file (YAML)
    #[arg(long, short, env = "YC_PROVIDER_CONFIG")]
    config: Option<PathBuf>,

    /// State file tracking applied resources
    #[arg(long, default_value = "yc-state.json", env = "YC_STATE_FILE")]
    state: PathBuf,

    /// Serve Prometheus metrics on this port while running
    #[arg(long)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Converge the cloud to a manifest
    Apply {
        /// Manifest of declared resources (YAML)
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Re-read every resource in the state file
    Refresh,
    /// Delete every resource in the state file
    Destroy,
    /// Check a manifest without calling the API
    Validate {
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::Validate { file } = &cli.command {
        let manifest = Manifest::from_file(file)?;
        info!(resources = manifest.resources.len(), "Manifest is valid");
        return Ok(());
    }

    let config = ProviderConfig::load(cli.config.as_deref()).context("loading provider config")?;
    config.validate()?;
    let ctx = Context::from_config(config)?;
    let mut store = StateStore::open(&cli.state)
        .with_context(|| format!("opening state file {}", cli.state.display()))?;

    if let Some(port) = cli.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = metrics::serve(port).await {
                error!(error = %e, "Metrics server failed");
            }
        });
        info!("Metrics server starting on port {}", port);
    }

    let run = async {
        match &cli.command {
            Command::Apply { file } => {
                let manifest = Manifest::from_file(file)?;
                apply::apply(&ctx, &manifest, &mut store).await
            }
            Command::Refresh => apply::refresh(&ctx, &mut store).await,
            Command::Destroy => apply::destroy(&ctx, &mut store).await,
            Command::Validate { .. } => Ok(Report::default()),
        }
    };

    let outcome = tokio::select! {
        result = run => Some(result),
        _ = shutdown_signal() => None,
    };

    match outcome {
        Some(result) => {
            let report = result?;
            info!(summary = ?report.summary(), state = %store.path().display(), "Run finished");
            Ok(())
        }
        None => {
            info!("Received shutdown signal, state file holds every change applied so far");
            anyhow::bail!("interrupted")
        }
    }
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
