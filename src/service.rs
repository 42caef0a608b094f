//! Prediction service: turns validated input into feature frames, dispatches
//! to the selected pipeline and shapes its output.

use serde_json::Value;

use crate::artifacts::{self, ArtifactPaths};
use crate::error::{ArtifactLoadError, ServiceError};
use crate::frame::FeatureFrame;
use crate::pipeline::{PredictionPipeline, Pipelines};
use crate::schema::PatientInput;
use crate::table::Table;
use crate::types::{ModelChoice, PredictionResponse, Record, batch_percent};

/// External request field → pipeline column. Applied to single records only.
pub const FIELD_MAPPING: [(&str, &str); 6] = [
    ("pregnancies", "Pregnancies"),
    ("glucose", "Glucose"),
    ("bp", "BloodPressure"),
    ("bmi", "BMI"),
    ("dpf", "DiabetesPedigreeFunction"),
    ("age", "Age"),
];

pub const PREDICTION_COLUMN: &str = "Prediction";
pub const PROBABILITY_COLUMN: &str = "Probability %";

/// Read-only after construction; share it behind an `Arc`.
pub struct DiabetesService {
    pipelines: Pipelines,
    background: Table,
}

impl DiabetesService {
    pub fn new(pipelines: Pipelines, background: Table) -> Self {
        Self {
            pipelines,
            background,
        }
    }

    /// # Errors
    /// Fails if either pipeline artifact is missing or corrupt.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactLoadError> {
        let pipelines = artifacts::load_pipelines(paths)?;
        let background = artifacts::load_background_data(&paths.background_data);
        Ok(Self::new(pipelines, background))
    }

    pub fn get_background_data(&self) -> Vec<Record> {
        self.background.records().to_vec()
    }

    #[tracing::instrument(skip(self, input), fields(model = %input.model_choice))]
    pub fn predict_single(&self, input: &PatientInput) -> Result<PredictionResponse, ServiceError> {
        let frame = rename_fields(&input.feature_fields())?;
        let (labels, probabilities) = self.run(input.model_choice, frame)?;

        let (label, fraction) = labels
            .first()
            .zip(probabilities.first())
            .ok_or_else(|| ServiceError::Prediction(anyhow::anyhow!("pipeline returned no rows")))?;
        Ok(PredictionResponse::new(*label, *fraction))
    }

    /// Columns of `table` must already carry pipeline column names; unlike
    /// [`Self::predict_single`] no renaming happens here.
    #[tracing::instrument(skip(self, table), fields(rows = table.len(), model = %model_choice))]
    pub fn predict_batch(
        &self,
        table: &Table,
        model_choice: ModelChoice,
    ) -> Result<Vec<Record>, ServiceError> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let frame = FeatureFrame::from_records(table.columns(), table.records());
        let (labels, probabilities) = self.run(model_choice, frame)?;

        Ok(table
            .records()
            .iter()
            .zip(labels.iter().zip(&probabilities))
            .map(|(record, (&label, &fraction))| {
                let mut record = record.clone();
                let outcome = if label == 1 { "Diabetic" } else { "Healthy" };
                record.insert(PREDICTION_COLUMN.to_string(), Value::from(outcome));
                record.insert(
                    PROBABILITY_COLUMN.to_string(),
                    Value::from(batch_percent(fraction)),
                );
                record
            })
            .collect())
    }

    /// Prepare features for `choice`, check them against the pipeline and
    /// run it. Returns one label and one probability per frame row.
    fn run(
        &self,
        choice: ModelChoice,
        frame: FeatureFrame,
    ) -> Result<(Vec<u8>, Vec<f64>), ServiceError> {
        let frame = choice
            .prepare_features(frame)
            .map_err(|column| missing_column(&column))?;

        let pipeline = self.pipelines.get(choice);
        if let Some(column) = pipeline
            .feature_names()
            .iter()
            .find(|name| !frame.has_column(name))
        {
            return Err(missing_column(column));
        }

        invoke(pipeline, &frame)
    }
}

fn invoke(
    pipeline: &dyn PredictionPipeline,
    frame: &FeatureFrame,
) -> Result<(Vec<u8>, Vec<f64>), ServiceError> {
    let labels = pipeline.predict(frame).map_err(ServiceError::Prediction)?;
    let probabilities = pipeline
        .predict_probability(frame)
        .map_err(ServiceError::Prediction)?;

    if labels.len() != frame.len() || probabilities.len() != frame.len() {
        return Err(ServiceError::Prediction(anyhow::anyhow!(
            "pipeline returned {} labels and {} probabilities for {} rows",
            labels.len(),
            probabilities.len(),
            frame.len()
        )));
    }
    if let Some(label) = labels.iter().find(|&&l| l > 1) {
        return Err(ServiceError::Prediction(anyhow::anyhow!(
            "pipeline returned class label {label}"
        )));
    }
    if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(ServiceError::Prediction(anyhow::anyhow!(
            "pipeline returned probability {p}"
        )));
    }
    Ok((labels, probabilities))
}

fn rename_fields(fields: &[(&str, f64)]) -> Result<FeatureFrame, ServiceError> {
    let renamed = fields
        .iter()
        .map(|&(field, value)| {
            FIELD_MAPPING
                .iter()
                .find(|(external, _)| *external == field)
                .map(|&(_, internal)| (internal, value))
                .ok_or_else(|| {
                    ServiceError::FeatureMapping(format!("no column mapping for field '{field}'"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureFrame::from_row(renamed))
}

fn missing_column(column: &str) -> ServiceError {
    ServiceError::FeatureMapping(format!("missing or non-numeric required column '{column}'"))
}
