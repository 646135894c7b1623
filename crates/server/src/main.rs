use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use azlab_server::api::{AppSettings, AppState};
use azlab_server::config::AzlabConfig;
use azlab_server::factory::AzureServiceFactory;

/// Keyless Azure demo server.
#[derive(Parser, Debug)]
#[command(
    name = "azlab-server",
    about = "Demo server for Managed Identity access to Blob Storage and PostgreSQL"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "azlab.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port (takes precedence over `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config_exists = Path::new(&cli.config).exists();
    let mut config: AzlabConfig = if config_exists {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };
    config.apply_env()?;

    let telemetry_guard = azlab_server::telemetry::init(&config.telemetry);

    if !config_exists {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if !config.storage.is_configured() {
        warn!("AZURE_STORAGE_ACCOUNT is not set, storage routes will report an error");
    }
    let settings = AppSettings::from_config(&config);
    if !settings.database_configured {
        warn!("PostgreSQL server or user is not set, database routes will report an error");
    }
    info!(
        storage_account = ?settings.storage_account,
        files_container = %settings.files_container,
        postgres_server = ?settings.postgres_server,
        postgres_database = %settings.postgres_database,
        "resolved Azure targets"
    );

    let state = AppState {
        services: Arc::new(AzureServiceFactory::from_config(&config)),
        settings: Arc::new(settings),
    };
    let app = azlab_server::api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "azlab-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry_guard.shutdown();

    info!("azlab-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
