//! Faucet service binary

use clap::Parser;
use koin_faucet::api::{self, AppState};
use koin_faucet::{Dispatcher, FaucetConfig, FaucetMetrics, PayoutPolicy, ThrottleStore};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Faucet service CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Database path (overrides config)
    #[arg(short, long)]
    database: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = if args.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match args.config {
        Some(path) => FaucetConfig::load(&path)?,
        None => FaucetConfig::default(),
    };

    if let Some(database) = args.database {
        config.db_path = database;
    }
    if let Some(listen) = args.listen {
        config.server_addr = listen;
    }

    config.validate()?;

    info!(
        listen = %config.server_addr,
        window_secs = config.rate_seconds,
        k = config.k,
        payout_cap = config.payout_cap,
        backend = ?config.chain.backend,
        db = %config.db_path,
        "starting koin faucet"
    );

    let db = sled::open(&config.db_path)
        .map_err(|e| anyhow::anyhow!("failed to open database at {}: {}", config.db_path, e))?;
    let throttle = ThrottleStore::open(&db)?;

    let client = koin_chain::connect(&config.chain, &config.token)?;
    let policy = PayoutPolicy::new(config.k, config.payout_cap)?;
    let metrics = Arc::new(FaucetMetrics::new()?);

    let dispatcher = Dispatcher::new(
        client,
        throttle,
        policy,
        config.chain.wallet_address.clone(),
        config.rate_seconds,
        metrics.clone(),
    );

    let state = Arc::new(AppState {
        dispatcher,
        token: config.token.clone(),
        metrics,
    });

    let mut app = api::router(state, config.metrics_enabled).layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    info!("listening on {}", config.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("faucet stopped");
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

    info!("shutdown signal received");
}
