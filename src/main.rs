use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use diabetes_api::api::{self, AppState};
use diabetes_api::config::Config;
use diabetes_api::service::DiabetesService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,diabetes_api=debug".into());
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Starting prediction server with config: {:?}", config);

    tracing::info!(models_dir = %config.models_dir.display(), "Loading model pipelines...");
    let service = DiabetesService::load(&config.artifact_paths())?;
    tracing::info!("Model pipelines loaded successfully");

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = api::router(
        AppState::new(Arc::new(service)),
        config.max_upload_bytes,
    );
    let app = api::with_web_assets(app, &config.index_page(), &config.static_dir())
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);
    let app = api::with_tracing(app);

    let listener = TcpListener::bind(&config.server_address()).await?;
    tracing::info!("Server running on http://{}", config.server_address());

    axum::serve(listener, app).await?;
    Ok(())
}
