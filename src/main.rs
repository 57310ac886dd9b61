use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use versell_pix_gateway::api::{self, AppState};
use versell_pix_gateway::cache::LazyStore;
use versell_pix_gateway::config::AppConfig;
use versell_pix_gateway::logging::init_tracing;
use versell_pix_gateway::payments::{PixGateway, VersellProvider};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
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
                error!(error = %e, "failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "🚀 Starting Versell PIX gateway"
    );

    // Log configuration
    info!(
        host = %config.server.host,
        port = config.server.port,
        public_base_url = ?config.server.public_base_url,
        versell = ?config.versell,
        status_ttl_secs = config.cache.status_ttl,
        "Server configuration loaded"
    );

    // Store selection is lazy; only announce what will be tried
    let store = Arc::new(LazyStore::new(config.cache.store_config()));
    match &config.cache.redis_url {
        Some(url) => info!(redis_url = %url, "🔄 Redis store configured, connecting on first use"),
        None => warn!(
            "⚠️  REDIS_URL not set: using the in-process store (lost on restart, not shared between instances)"
        ),
    }

    let gateway = Arc::new(VersellProvider::new(config.versell.clone())?);
    if let Err(e) = gateway.ensure_configured() {
        warn!(error = %e, "⚠️  Versell credentials missing: charge and poll requests will fail");
    }

    let state = AppState::new(
        gateway,
        store,
        config.cache.retention(),
        config.server.public_base_url.clone(),
    );

    info!("🛣️  Setting up application routes...");
    let app = api::router(state);
    info!("✅ Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║            🚀 VERSELL PIX GATEWAY IS RUNNING 🚀              ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  🌐 Server Address:  http://{}", addr);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  POST {}          - Create PIX charge", api::QRCODE_PATH);
    println!("║  POST {}         - Provider webhook", api::WEBHOOK_PATH);
    println!("║  GET  {}    - Stored status", api::STATUS_CACHE_PATH);
    println!("║  GET  {}     - Status by transaction", api::TRANSACTION_PATH);
    println!("║  POST {}          - Ask the provider", api::POLL_STATUS_PATH);
    println!("║  GET  /health                    - Health check");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    info!(address = %addr, "🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}
