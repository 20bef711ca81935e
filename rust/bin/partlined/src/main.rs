//! `partlined` — the production line server binary.
//!
//! Usage:
//!   partlined -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/partline/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use partline_core::Module;
use tracing::info;

use config::ServerConfig;

/// Production line server.
#[derive(Parser, Debug)]
#[command(name = "partlined", about = "Production line identifier and serial server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = partline_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let kv: Arc<dyn partline_kv::KVStore> = Arc::new(
        partline_kv::RedbStore::open(&core_config.resolve_db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    let sql: Arc<dyn partline_sql::SQLStore> = Arc::new(
        partline_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let service = production::service::ProductionService::new(
        kv,
        sql,
        server_config.service_options(),
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize production service: {}", e))?;
    let module = production::ProductionModule::start(service, server_config.scheduler_config()).await;
    info!("Production module initialized");

    let app = routes::build_router(vec![(module.name(), module.routes())]);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("partlined listening on {}", core_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    module.shutdown().await;
    info!("partlined stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
