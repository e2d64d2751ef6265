//! perfmap-server - performance event REST API
//!
//! Serves the event list, accepts new and edited events (with optional poster
//! uploads) and serves stored posters.

use anyhow::Result;
use clap::Parser;
use perfmap_common::config::{
    RootFolderInitializer, RootFolderResolver, ServerSettings, TomlConfig,
};
use perfmap_server::{build_router, db, AppState, UploadStore};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments (override environment and config file)
#[derive(Debug, Parser)]
#[command(name = "perfmap-server", version, about = "Performance event REST API")]
struct Args {
    /// Root folder holding perfmap.db and uploads/
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "PERFMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "PERFMAP_BIND")]
    bind: Option<String>,

    /// Listen port
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = TomlConfig::load_or_default(args.config.as_deref());
    let toml_config = loaded.config.clone();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(toml_config.logging.level.parse()?),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting perfmap-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log();

    let mut settings = ServerSettings::from_toml(&toml_config);
    if let Some(bind) = args.bind {
        settings.bind = bind;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }

    let root_folder = RootFolderResolver::new("perfmap-server")
        .with_cli_arg(args.root_folder)
        .with_toml(&toml_config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match db::init_database(&db_path, settings.max_connections).await {
        Ok(pool) => {
            info!("✓ Connected to database (pool size {})", settings.max_connections);
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let uploads = UploadStore::new(initializer.uploads_path(), settings.upload_limit_bytes);
    info!("Poster uploads: {}", uploads.dir().display());

    let state = AppState::new(pool, uploads);
    let app = build_router(state);

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("perfmap-server listening on http://{}", addr);
    info!("Status check: http://{}/api/status", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("perfmap-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
