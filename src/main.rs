//! News Service — Binary Entrypoint
//! Validates configuration, starts the periodic crawler, and serves `/news`
//! until Ctrl-C / SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use news_service::config::{init_tracing, AppConfig, LogLevel};
use news_service::crawl::fetch::HttpFetcher;
use news_service::crawl::scheduler::Scheduler;
use news_service::crawl::Crawler;
use news_service::metrics::Metrics;
use news_service::middleware::BoundaryPolicy;
use news_service::{create_router, AppState, NewsStore};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    // Tracing first, so configuration errors below are reported through it.
    let level = LogLevel::from_lookup(|k| std::env::var(k).ok());
    init_tracing(level.as_ref().copied().unwrap_or_default());

    let result = match level {
        Ok(_) => run().await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "news service terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // --- Configuration (fatal on error, before any network activity) ---
    let cfg = AppConfig::from_env().context("invalid configuration")?;
    let boundary =
        BoundaryPolicy::from_config(&cfg.cors, &cfg.csrf).context("invalid configuration")?;
    let store = Arc::new(NewsStore::with_capacity(cfg.capacity)?);
    let fetcher = Arc::new(HttpFetcher::new(cfg.fetch_timeout)?);

    let metrics = if cfg.metrics_enabled {
        Some(Metrics::init()?)
    } else {
        None
    };

    info!(
        log_level = %cfg.log_level,
        sources = cfg.sources.len(),
        capacity = cfg.capacity,
        "configuration loaded"
    );

    // --- HTTP ---
    let mut app = create_router(AppState::new(store.clone()), &boundary);
    if let Some(m) = &metrics {
        app = app.merge(m.router());
    }
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;

    // --- Crawler ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let crawler = Crawler::new(cfg.sources, fetcher, cfg.extractor, store);
    let scheduler = Scheduler::new(cfg.scheduler, crawler).start(shutdown_rx);

    info!(addr = %cfg.bind_addr, "API server running");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server");

    let _ = shutdown_tx.send(true);
    scheduler.join().await;
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("received shutdown signal");
}
