/// HTTP API поверх конвейера предсказания и описательной статистики

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::dataset::Dataset;
use crate::error::{DemandError, Result};
use crate::models::{DescriptiveAggregator, ModelAdapter, PredictionPipeline};
use crate::preprocessing::{FeatureEngineer, FEATURE_SCHEMA_VERSION};
use crate::types::{
    AnalysisOutput, DashboardOutput, HistoricalRecord, ModelInfo, PredictionResult, RawInputs,
};

pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Общее неизменяемое состояние: датасет и модель загружаются один раз
#[derive(Clone)]
pub struct AppState {
    dataset: Arc<Dataset>,
    pipeline: Arc<PredictionPipeline>,
    model_info: Arc<ModelInfo>,
}

impl AppState {
    /// Оценивает модель на всём датасете и собирает конвейер предсказания.
    ///
    /// R² считается по всем историческим записям без отложенной выборки,
    /// поэтому он завышен относительно честной оценки на новых данных.
    pub fn build(dataset: Dataset, adapter: ModelAdapter) -> Result<Self> {
        let summary = DescriptiveAggregator::new(&dataset).summary();

        let (frame, targets) = FeatureEngineer::design_matrix(dataset.records());
        let r2_score = adapter.score(&frame, &targets.to_vec())?;
        tracing::info!(
            "Model R² on {} historical days: {:.3}",
            summary.days,
            r2_score
        );

        let model_info = ModelInfo {
            r2_score,
            schema_version: FEATURE_SCHEMA_VERSION,
            feature_names: adapter.feature_names().to_vec(),
            days: summary.days,
            first_date: summary.first_date,
            last_date: summary.last_date,
            min_count: summary.min_count,
            max_count: summary.max_count,
        };

        let pipeline = PredictionPipeline::new(Arc::new(adapter), summary.mean_count);

        Ok(Self {
            dataset: Arc::new(dataset),
            pipeline: Arc::new(pipeline),
            model_info: Arc::new(model_info),
        })
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }
}

pub struct ApiError(DemandError);

impl From<DemandError> for ApiError {
    fn from(err: DemandError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        tracing::warn!("Request failed ({}): {}", status, self.0);

        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/predict", post(predict))
        .route("/api/dashboard", get(dashboard))
        .route("/api/analysis", get(analysis))
        .route("/api/data", get(data_preview))
        .route("/api/model", get(model))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Bike Demand API (Rust)",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn predict(
    State(state): State<AppState>,
    Json(raw): Json<RawInputs>,
) -> std::result::Result<Json<PredictionResult>, ApiError> {
    tracing::info!(
        "Predict request: season={}, mnth={}, weekday={}, weathersit={}",
        raw.season.label(),
        raw.mnth,
        raw.weekday.label(),
        raw.weathersit.label()
    );

    let result = state.pipeline.predict(&raw)?;
    Ok(Json(result))
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardOutput> {
    tracing::info!("Dashboard request");
    Json(DescriptiveAggregator::new(&state.dataset).dashboard())
}

async fn analysis(State(state): State<AppState>) -> Json<AnalysisOutput> {
    tracing::info!("Analysis request");
    Json(DescriptiveAggregator::new(&state.dataset).analysis())
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    limit: Option<usize>,
}

async fn data_preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Json<Vec<HistoricalRecord>> {
    let limit = query.limit.unwrap_or(DEFAULT_PREVIEW_ROWS);
    Json(state.dataset.head(limit).to_vec())
}

async fn model(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.model_info().clone())
}
