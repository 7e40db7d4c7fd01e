mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use sitewatch_core::{
    ClientConfig, Hub, NotifierService, Probe, ProbeError, Scheduler, StaticNotifierRepository,
};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        // Leak is fine, called once and lives for the program's lifetime.
        Box::leak(VERSION.to_string().into_boxed_str())
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Site uptime monitor with alerting on status changes.
#[derive(Parser)]
#[command(name = "sitewatch", version = version_string(), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor the sites from a config file until interrupted.
    Run {
        /// Path to TOML config file.
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Probe a single URL once and print its status.
    Check {
        url: String,

        /// Request timeout in milliseconds.
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config).await,
        Commands::Check { url, timeout_ms } => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            check(url, timeout_ms).await;
        }
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_format {
        "json" => fmt().with_env_filter(filter).json().init(),
        _ => fmt().with_env_filter(filter).init(),
    }
}

async fn run(path: PathBuf) {
    let app_config = match config::AppConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&app_config.log_format);
    tracing::info!(
        path = %path.display(),
        sites = app_config.site.len(),
        notifiers = app_config.notifier.len(),
        "Loaded config file"
    );

    let repository = Arc::new(StaticNotifierRepository::new(app_config.notifier.clone()));
    let service = NotifierService::new(repository);
    let scheduler = Scheduler::new();

    for def in &app_config.site {
        let site = Arc::new(def.to_site(&app_config.defaults));
        let hub = Arc::new(Hub::new());

        match service.sync_observers(site.id(), &hub).await {
            Ok(count) => {
                tracing::info!(site_id = site.id(), observers = count, "Notifiers configured");
            }
            Err(e) => {
                tracing::error!(site_id = site.id(), error = %e, "Failed to configure notifiers");
                std::process::exit(1);
            }
        }

        if let Err(e) = scheduler.register(site, hub) {
            tracing::error!(error = %e, "Registration failed");
            std::process::exit(1);
        }
    }

    tracing::info!(sites = scheduler.len(), "Monitoring, press ctrl-c to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    tracing::info!("Shutting down");
    for def in &app_config.site {
        scheduler.revoke(def.id);
    }
}

async fn check(url: String, timeout_ms: u64) {
    let client_config =
        ClientConfig::default().with_request_timeout(Duration::from_millis(timeout_ms));
    let probe = Probe::new(&client_config);

    match probe.check(&url).await {
        Ok(()) => {
            println!("{} {}", style("up").green().bold(), url);
        }
        Err(e) => {
            let label = match e {
                ProbeError::Unhealthy { .. } => style("down").red().bold(),
                ProbeError::Transport { .. } => style("error").yellow().bold(),
            };
            println!("{} {}: {}", label, url, e);
            std::process::exit(1);
        }
    }
}
