//! HTTP surface of the prediction service

pub mod routes;

use crate::error::ApiError;
use crate::models::inference::InferenceEngine;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

/// Version reported by the status endpoint
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// State shared by every worker. The engine is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
}

impl AppState {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Register every route plus the JSON body configuration
pub fn configure(json_limit_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let json_config = web::JsonConfig::default()
            .limit(json_limit_bytes)
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

        cfg.app_data(json_config)
            .route("/", web::get().to(routes::health))
            .route("/predict", web::post().to(routes::predict))
            .route("/model-info", web::get().to(routes::model_info))
            .route("/schema", web::get().to(routes::schema));
    }
}

/// Fallback for unknown routes
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound(format!("{} {}", req.method(), req.path())))
}
