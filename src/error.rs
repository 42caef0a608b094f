use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// A single rejected field, reported with its location in the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl FieldError {
    pub fn body(field: Option<&str>, kind: &'static str, msg: impl Into<String>) -> Self {
        let mut loc = vec!["body".to_string()];
        if let Some(field) = field {
            loc.push(field.to_string());
        }
        Self {
            loc,
            msg: msg.into(),
            kind,
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.loc.get(1).map(String::as_str)
    }
}

/// Every field that failed validation, not just the first one.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{} invalid field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().filter_map(FieldError::field).collect()
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("feature mapping failed: {0}")]
    FeatureMapping(String),

    #[error("malformed CSV upload: {0}")]
    MalformedCsv(String),

    #[error("upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("prediction failed: {0:#}")]
    Prediction(anyhow::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::FeatureMapping(_) | Self::MalformedCsv(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(errors) => json!({ "detail": errors.errors }),
            Self::FeatureMapping(_) | Self::MalformedCsv(_) | Self::PayloadTooLarge(_) => {
                json!({ "detail": self.to_string() })
            }
            Self::Prediction(_) => {
                tracing::error!(error = %self, "Prediction pipeline failed");
                json!({ "detail": "Prediction failed" })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Startup-time failure to load a model artifact. Fatal: the server does not start.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("model artifact {} not found", .path.display())]
    Missing { path: PathBuf },

    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}
