use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use metrics::counter;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::{FieldError, ServiceError, ValidationErrors};
use crate::schema::PatientInput;
use crate::service::DiabetesService;
use crate::table::Table;
use crate::types::{BatchResponse, HealthResponse, ModelChoice, PredictionResponse, Record};

#[derive(Clone)]
pub struct AppState {
    service: Arc<DiabetesService>,
}

impl AppState {
    pub fn new(service: Arc<DiabetesService>) -> Self {
        Self { service }
    }
}

/// JSON API routes. Metrics, static pages and request tracing are layered on
/// by the binary.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/background-data", get(background_data_handler))
        .route("/api/predict", post(predict_handler))
        .route(
            "/api/batch-predict",
            post(batch_predict_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serve the landing page at `/` and assets under `/static`.
pub fn with_web_assets(router: Router, index_page: &Path, static_dir: &Path) -> Router {
    router
        .route_service("/", ServeFile::new(index_page))
        .nest_service("/static", ServeDir::new(static_dir))
}

/// Outermost layer: one span per request, whichever route serves it.
pub fn with_tracing(router: Router) -> Router {
    router.layer(TraceLayer::new_for_http())
}

fn multipart_error(e: MultipartError, field: Option<&str>) -> ServiceError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServiceError::PayloadTooLarge(e.body_text());
    }
    ValidationErrors::single(FieldError::body(field, "multipart_invalid", e.body_text())).into()
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "awake" })
}

#[tracing::instrument(skip(state))]
async fn background_data_handler(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.service.get_background_data())
}

#[tracing::instrument(skip(state, payload))]
async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let Json(body) = payload.map_err(|rejection| {
        ValidationErrors::single(FieldError::body(None, "json_invalid", rejection.body_text()))
    })?;
    let input = PatientInput::from_json(&body)?;

    counter!("predictions_total", "mode" => "single", "model" => input.model_choice.as_str())
        .increment(1);
    tracing::info!(model = %input.model_choice, "Processing prediction request");

    let response = state.service.predict_single(&input).inspect_err(|e| {
        counter!("prediction_failures_total", "mode" => "single").increment(1);
        tracing::warn!(error = %e, "Prediction request failed");
    })?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state, multipart))]
async fn batch_predict_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, ServiceError> {
    let mut file = None;
    let mut model_choice = None;
    let mut errors = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e, None)),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, Some("file")))?;
                tracing::info!(bytes = bytes.len(), "Received batch file");
                file = Some(bytes);
            }
            Some("model_choice") => {
                let token = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, Some("model_choice")))?;
                match token.parse::<ModelChoice>() {
                    Ok(choice) => model_choice = Some(choice),
                    Err(e) => errors.push(FieldError::body(
                        Some("model_choice"),
                        "enum",
                        e.to_string(),
                    )),
                }
            }
            _ => {}
        }
    }

    if file.is_none() {
        errors.push(FieldError::body(Some("file"), "missing", "Field required"));
    }
    if model_choice.is_none() && !errors.iter().any(|e| e.field() == Some("model_choice")) {
        errors.push(FieldError::body(
            Some("model_choice"),
            "missing",
            "Field required",
        ));
    }
    let (Some(file), Some(model_choice)) = (file, model_choice) else {
        return Err(ValidationErrors { errors }.into());
    };

    counter!("predictions_total", "mode" => "batch", "model" => model_choice.as_str()).increment(1);

    let service = state.service.clone();
    let results = tokio::task::spawn_blocking(move || -> Result<Vec<Record>, ServiceError> {
        let table = Table::from_csv_bytes(&file)?;
        service.predict_batch(&table, model_choice)
    })
    .await
    .map_err(|e| ServiceError::Prediction(anyhow::anyhow!("batch task failed: {e}")))?
    .inspect_err(|e| {
        counter!("prediction_failures_total", "mode" => "batch").increment(1);
        tracing::warn!(error = %e, "Batch prediction failed");
    })?;

    tracing::info!(rows = results.len(), "Batch prediction completed");
    Ok(Json(BatchResponse { results }))
}
