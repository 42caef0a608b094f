use anyhow::Result;
use std::sync::Arc;

use crate::frame::FeatureFrame;
use crate::types::ModelChoice;

pub const BMI_AGE_INTERACTION: &str = "BMI_Age_Interaction";

/// A pre-fit classification pipeline over a named feature frame.
pub trait PredictionPipeline: Send + Sync {
    /// Columns the pipeline was fit on, in training order.
    fn feature_names(&self) -> &[String];

    /// Class label (0 or 1) per row.
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<u8>>;

    /// Probability of the positive class per row.
    fn predict_probability(&self, frame: &FeatureFrame) -> Result<Vec<f64>>;
}

/// The two loaded pipelines, keyed by [`ModelChoice`].
#[derive(Clone)]
pub struct Pipelines {
    logistic: Arc<dyn PredictionPipeline>,
    decision_tree: Arc<dyn PredictionPipeline>,
}

impl Pipelines {
    pub fn new(
        logistic: Arc<dyn PredictionPipeline>,
        decision_tree: Arc<dyn PredictionPipeline>,
    ) -> Self {
        Self {
            logistic,
            decision_tree,
        }
    }

    pub fn get(&self, choice: ModelChoice) -> &dyn PredictionPipeline {
        match choice {
            ModelChoice::LogisticRegression => self.logistic.as_ref(),
            ModelChoice::DecisionTree => self.decision_tree.as_ref(),
        }
    }
}

impl ModelChoice {
    /// Derive the features this choice's pipeline was trained with on top of
    /// the raw columns. Returns the name of a missing input column on failure.
    pub fn prepare_features(&self, frame: FeatureFrame) -> Result<FeatureFrame, String> {
        match self {
            Self::LogisticRegression => with_bmi_age_interaction(frame),
            Self::DecisionTree => Ok(frame),
        }
    }
}

/// Logistic regression was trained with an extra `BMI × Age` column.
fn with_bmi_age_interaction(mut frame: FeatureFrame) -> Result<FeatureFrame, String> {
    let bmi = frame.column("BMI").ok_or("BMI")?;
    let age = frame.column("Age").ok_or("Age")?;
    let interaction = bmi.iter().zip(&age).map(|(b, a)| b * a).collect();
    frame.push_column(BMI_AGE_INTERACTION, interaction);
    Ok(frame)
}
