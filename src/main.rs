use std::net::SocketAddr;
use std::time::Duration;
use tour_concierge::{
    api::{build_router, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration before logging so the log format can follow it
    let config = Config::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "tour_concierge={},tower_http=info",
            config.observability.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        service = %config.observability.service_name,
        "Starting tour concierge v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = tour_concierge::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("Prometheus metrics initialized");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    match config.to_toml() {
        Ok(rendered) => tracing::debug!("Effective configuration:\n{}", rendered),
        Err(e) => tracing::warn!("Could not render configuration: {}", e),
    }

    let http_addr: SocketAddr =
        format!("{}:{}", config.server.host, config.server.http_port).parse()?;
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    let state = AppState::bootstrap(config).await?;
    tracing::info!(documents = state.index.len(), "Content index ready");

    let app = build_router(state).layer(tower_http::timeout::TimeoutLayer::new(request_timeout));

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Chat: http://{}/v1/chat", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
