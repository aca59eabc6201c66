use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rproxy::config::Args;
use rproxy::handlers::router;
use rproxy::persistence::{FileSink, LogSink, PersistenceSink};
use rproxy::state::AppState;
use rproxy::worker::{persistence_worker, window_sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting rproxy {}", env!("CARGO_PKG_VERSION"));

    let (state, persist_rx) = AppState::from_args(&args)?;
    let state = Arc::new(state);

    // pick the persistence sink
    let sink: Arc<dyn PersistenceSink> = match &args.store_dir {
        Some(dir) => {
            let sink = FileSink::open(dir).await?;
            info!(dir = %sink.dir().display(), "Persisting exchanges to disk");
            Arc::new(sink)
        }
        None => {
            info!("No store directory, exchanges go to the log");
            Arc::new(LogSink)
        }
    };

    // spawn the background workers
    tokio::spawn(persistence_worker(persist_rx, sink));
    if args.sweep_interval > 0 {
        tokio::spawn(window_sweeper(
            state.rate_limiter.clone(),
            Duration::from_secs(args.sweep_interval),
        ));
    }

    let app = router(state.clone());

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, upstream = %state.upstream, "Proxy listening");
    info!(
        rate_limit = args.rate_limit,
        rate_window_secs = args.rate_window,
        mode = ?state.rate_limiter.mode(),
        "Rate limit configured"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("rproxy stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
