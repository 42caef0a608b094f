use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::frame::FeatureFrame;
use crate::pipeline::PredictionPipeline;

/// Standardization step fit alongside the classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Scaler followed by a binary logistic regression.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticPipeline {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticPipeline {
    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err("no feature names".to_string());
        }
        if self.coefficients.len() != n {
            return Err(format!(
                "{} coefficients for {n} features",
                self.coefficients.len()
            ));
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(format!("scaler does not cover {n} features"));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err("scaler has a zero or non-finite scale".to_string());
            }
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("non-finite weights".to_string());
        }
        Ok(())
    }

    fn decision_function(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        let rows = frame
            .select(&self.feature_names)
            .map_err(|column| anyhow!("feature frame is missing column '{column}'"))?;

        rows.iter()
            .map(|row| {
                let z = row
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| {
                        let x = match &self.scaler {
                            Some(scaler) => (x - scaler.mean[i]) / scaler.scale[i],
                            None => x,
                        };
                        x * self.coefficients[i]
                    })
                    .sum::<f64>()
                    + self.intercept;
                if z.is_nan() {
                    Err(anyhow!("decision function is NaN"))
                } else {
                    Ok(z)
                }
            })
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl PredictionPipeline for LogisticPipeline {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<u8>> {
        Ok(self
            .decision_function(frame)?
            .into_iter()
            .map(|z| u8::from(z > 0.0))
            .collect())
    }

    fn predict_probability(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        Ok(self
            .decision_function(frame)?
            .into_iter()
            .map(sigmoid)
            .collect())
    }
}
