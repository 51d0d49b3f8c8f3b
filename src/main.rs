use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use neo_analytics::adapters::{
    app_router, ConnectionTracker, DashboardFanout, DashboardRegistry, InMemoryBroker,
    RedisStreamBroker, RelayAppState,
};
use neo_analytics::application::{BridgeSettings, BrokerBridge, BrokerStatus, IngestEventHandler};
use neo_analytics::config::{AppConfig, BrokerConfig, BrokerMode, LogFormat, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.server);

    tracing::info!(
        environment = ?config.server.environment,
        broker_mode = config.broker.mode.as_str(),
        topic = %config.broker.topic,
        "Starting neo-analytics relay"
    );

    let status = Arc::new(BrokerStatus::new());
    let (bridge, memory_log) =
        build_bridge(&config.broker, config.is_production(), status.clone()).await;
    let bridge = Arc::new(bridge);
    let registry = Arc::new(DashboardRegistry::new());

    let consumer = bridge.spawn_consume_loop(DashboardFanout::new_shared(registry.clone()));

    let state = RelayAppState {
        ingest: Arc::new(IngestEventHandler::new(bridge.clone())),
        status,
        registry,
        connections: Arc::new(ConnectionTracker::new()),
        mode: config.broker.mode,
        outbound_capacity: config.dashboard.outbound_capacity,
        memory_log,
    };
    let app = app_router(state, &config.server.cors_origins_list());

    let addr = config
        .server
        .socket_addr()
        .context("Invalid server bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    consumer.abort();
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Pick the broker adapter. An unreachable Redis leaves the relay running
/// in degraded mode rather than refusing to start.
///
/// The in-memory broker is also returned so `/health` can report its size.
async fn build_bridge(
    config: &BrokerConfig,
    is_production: bool,
    status: Arc<BrokerStatus>,
) -> (BrokerBridge, Option<Arc<InMemoryBroker>>) {
    let settings = BridgeSettings::from(config);

    match config.mode {
        BrokerMode::Memory => {
            tracing::warn!(
                production = is_production,
                "Running with in-memory broker, events are not persisted"
            );
            let broker = Arc::new(InMemoryBroker::new(config.memory_retention));
            let bridge = BrokerBridge::new(broker.clone(), broker.clone(), status, settings);
            (bridge, Some(broker))
        }
        BrokerMode::Redis => match RedisStreamBroker::connect(config).await {
            Ok(broker) => {
                let broker = Arc::new(broker);
                (BrokerBridge::new(broker.clone(), broker, status, settings), None)
            }
            Err(e) => {
                tracing::error!(error = %e, "Broker connection failed, running degraded");
                (BrokerBridge::disconnected(status, settings), None)
            }
        },
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
