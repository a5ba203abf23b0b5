//! Request handlers

use crate::api::{AppState, API_VERSION};
use crate::error::ApiError;
use crate::types::customer::CustomerRecord;
use crate::types::prediction::{HealthResponse, ModelInfo, PredictionResponse};
use actix_web::{web, HttpResponse};
use schemars::schema_for;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, error, warn};

/// `GET /`: service status
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let model = state.engine.model();
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: true,
        api_version: API_VERSION.to_string(),
        model_name: model.name.clone(),
        model_version: model.version.clone(),
        loaded_at: model.loaded_at,
    })
}

/// `POST /predict`: score one customer record
pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let start_time = Instant::now();

    let record = CustomerRecord::from_json(&body).map_err(|e| {
        warn!(fields = ?e.fields(), "Prediction request failed validation");
        ApiError::Validation(e)
    })?;

    let engine = state.engine.clone();
    let result = web::block(move || engine.predict(&record))
        .await
        .map_err(|e| {
            error!(error = %e, "Blocking inference task failed");
            ApiError::Internal(e.to_string())
        })?
        .map_err(|e| {
            error!(error = %e, "Inference failed");
            ApiError::Inference(e)
        })?;

    debug!(
        prediction = %result.label,
        probability = result.probability,
        elapsed_us = start_time.elapsed().as_micros() as u64,
        "Prediction served"
    );

    let response = result.to_response(&state.engine.model().version);
    Ok(HttpResponse::Ok().json(response))
}

/// `GET /model-info`: loaded artifact metadata
pub async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.model_info())
}

/// `GET /schema`: JSON Schemas of the request and response bodies
pub async fn schema() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "title": "Term Deposit Prediction API",
        "version": API_VERSION,
        "paths": {
            "/": { "get": { "response": schema_for!(HealthResponse) } },
            "/predict": {
                "post": {
                    "request": schema_for!(CustomerRecord),
                    "response": schema_for!(PredictionResponse)
                }
            },
            "/model-info": { "get": { "response": schema_for!(ModelInfo) } }
        }
    }))
}
