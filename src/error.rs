//! Error types for the term deposit prediction service

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the model artifact.
///
/// Every variant is fatal at startup: the server never binds its port when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file missing or unreadable
    #[error("cannot read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact is not valid JSON or does not match the artifact schema
    #[error("corrupted model artifact: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Artifact references a component this binary was not built with
    #[error("artifact references unknown {kind} `{name}`")]
    UnresolvedComponent { kind: &'static str, name: String },

    /// Artifact format version not understood by this binary
    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Artifact parsed but is structurally inconsistent
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// A single failing request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request validation failure, carrying every failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Names of the fields that failed validation.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while scoring a single record.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("feature column `{0}` missing after preprocessing")]
    MissingColumn(String),

    #[error("column `{column}` has the wrong kind: expected {expected}")]
    ColumnKind {
        column: String,
        expected: &'static str,
    },

    #[error("unknown category `{value}` for column `{column}`")]
    UnknownCategory { column: String, value: String },

    #[error("feature `{0}` is not finite")]
    NonFinite(String),

    #[error("estimator returned {found} probabilities, expected {expected}")]
    OutputShape { found: usize, expected: usize },

    #[error("estimator backend failed: {0}")]
    Backend(String),
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request body: {0}")]
    BadRequest(String),

    #[error("request validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("no route for {0}")]
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody<'a, T: Serialize> {
    error: &'a str,
    detail: T,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            ApiError::BadRequest(msg) => builder.json(ErrorBody {
                error: "bad_request",
                detail: msg,
            }),
            ApiError::Validation(err) => builder.json(ErrorBody {
                error: "validation_error",
                detail: &err.errors,
            }),
            ApiError::Inference(err) => builder.json(ErrorBody {
                error: "inference_error",
                detail: err.to_string(),
            }),
            ApiError::Internal(msg) => builder.json(ErrorBody {
                error: "internal_error",
                detail: msg,
            }),
            ApiError::NotFound(path) => builder.json(ErrorBody {
                error: "not_found",
                detail: format!("no route for {}", path),
            }),
        }
    }
}
