/// API сервер прогнозирования спроса на велосипеды

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bike_demand::{
    config::AppConfig,
    server::{self, AppState},
    Dataset, LinearPipelineModel, ModelAdapter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;

    // Без датасета и модели сервис бесполезен: ошибки загрузки фатальны
    let dataset = Dataset::load(&config.data_path)
        .with_context(|| format!("loading dataset {}", config.data_path.display()))?;
    let model = LinearPipelineModel::load(&config.model_path)
        .with_context(|| format!("loading model artifact {}", config.model_path.display()))?;

    let state = AppState::build(dataset, ModelAdapter::new(model))
        .context("evaluating model on the historical dataset")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
