use api_rest::{router, AppState, AssetSource};
use clap::Parser;
use courseviewer_core::{
    constants::{
        DEFAULT_BASE_PATH, DEFAULT_DB_PATH, DEFAULT_HIDDEN_EXTENSIONS, DEFAULT_PORT,
        DEFAULT_WEB_ROOT,
    },
    CoreConfig, HiddenExtensions, ReadStatusStore, StorageMode,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "courseviewer-run")]
#[command(about = "Browse a directory of course content in the browser")]
struct Args {
    /// Directory containing the course content
    #[arg(long, default_value = DEFAULT_BASE_PATH)]
    path: PathBuf,
    /// Serve UI assets from --web-root instead of the embedded copy
    #[arg(long)]
    dev: bool,
    /// Comma-separated file extensions to hide from the tree
    #[arg(long, default_value = DEFAULT_HIDDEN_EXTENSIONS)]
    hide: String,
    /// Read-status storage: "memory" or "file"
    #[arg(long, default_value = "memory")]
    db: String,
    /// SQLite file used when --db=file
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    dbpath: PathBuf,
    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Directory holding static/ and templates/ in dev mode
    #[arg(long, default_value = DEFAULT_WEB_ROOT)]
    web_root: PathBuf,
}

/// Main entry point for the CourseViewer server
///
/// Validates the configuration, opens the read-status store and serves the REST API and
/// browser UI on `0.0.0.0:<port>` until Ctrl-C.
///
/// # Environment Variables
/// - `RUST_LOG`: log filter, on top of the default `courseviewer=info` directives
///
/// # Returns
/// * `Ok(())` - If the server shuts down cleanly
/// * `Err(anyhow::Error)` - If the base path or store is unusable, or the port cannot be bound
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("courseviewer_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("courseviewer_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let hidden = HiddenExtensions::parse_list(&args.hide);
    let cfg = Arc::new(CoreConfig::new(&args.path, hidden)?);
    tracing::info!("++ Serving content from {}", cfg.base_path().display());
    if !cfg.hidden_extensions().is_empty() {
        tracing::info!(
            "Hiding extensions: {}",
            cfg.hidden_extensions().as_slice().join(", ")
        );
    }

    let storage = StorageMode::from_flags(&args.db, &args.dbpath)?;
    let store = Arc::new(ReadStatusStore::open(&storage)?);

    let assets = if args.dev {
        tracing::info!(
            "Running in development mode, serving UI from {}",
            args.web_root.display()
        );
        AssetSource::Local(args.web_root)
    } else {
        tracing::info!("Running in production mode, serving embedded UI");
        AssetSource::Embedded
    };

    let app = router(AppState::new(cfg, store, assets));

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("++ Starting CourseViewer on http://localhost:{}", args.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CourseViewer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
