use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;
use feed_relay::{
    AppState,
    api::routes::{LINKS_PATH, create_router},
    cache::FeedCache,
    config::{Cli, ConfigOrigin, ConfigStore},
    fetcher::{FeedFetcher, HttpFetcher},
    scheduler::Refresher,
    watcher,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load RUST_LOG and friends from .env if present
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("feed_relay=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let Some(origin) = ConfigOrigin::from_cli(&cli) else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Any problem with the initial configuration is fatal
    let config = origin.load()?;
    let listen_addr = config.listen_addr()?;

    let config = Arc::new(ConfigStore::new(config));
    let cache = Arc::new(FeedCache::new());
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFetcher);
    let refresher = Arc::new(Refresher::new(
        Arc::clone(&config),
        Arc::clone(&cache),
        fetcher,
    ));

    // Dropping the watcher closes the event stream, so hold it until exit
    let _watcher = match origin.watch_path() {
        Some(path) => {
            let (watcher, events) = watcher::watch(path)?;
            info!("Watching {} for changes", path.display());
            let refresher = Arc::clone(&refresher);
            let origin = origin.clone();
            tokio::spawn(async move { refresher.run_config_watch(origin, events).await });
            Some(watcher)
        }
        None => {
            info!("Configuration read from stdin, reload disabled");
            None
        }
    };

    info!("Filling cache...");
    refresher.refresh().await;

    info!(
        "Starting cache ttl timer ({} seconds)",
        config.snapshot().cache_ttl().as_secs()
    );
    {
        let refresher = Arc::clone(&refresher);
        tokio::spawn(async move { refresher.run_ttl().await });
    }

    let app = create_router(AppState { cache });
    let listener = TcpListener::bind(&listen_addr).await?;
    info!(
        "Serving http://{}{} (Ctrl-C to stop)",
        listener.local_addr()?,
        LINKS_PATH
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
