//! HTTP service for diabetic risk prediction from two pre-trained pipelines.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod frame;
pub mod logistic;
pub mod pipeline;
pub mod schema;
pub mod service;
pub mod table;
pub mod tree;
pub mod types;

pub use error::{ArtifactLoadError, ServiceError, ValidationErrors};
pub use pipeline::{PredictionPipeline, Pipelines};
pub use schema::PatientInput;
pub use service::DiabetesService;
pub use types::{ModelChoice, PredictionResponse};
