use service_core::observability::init_tracing;
use shipment_service::config::ShipmentConfig;
use shipment_service::services::init_metrics;
use shipment_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = ShipmentConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        "shipment-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    // Must precede the first recorded metric
    init_metrics().map_err(|e| {
        tracing::error!("Failed to initialize metrics: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
