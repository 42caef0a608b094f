//! Loading of the trained pipelines and the background dataset from the
//! models directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ArtifactLoadError;
use crate::logistic::LogisticPipeline;
use crate::pipeline::{PredictionPipeline, Pipelines};
use crate::table::Table;
use crate::tree::DecisionTreePipeline;
use crate::types::ModelChoice;

pub const LOGISTIC_MODEL_FILE: &str = "logistic_model.json";
pub const DECISION_TREE_MODEL_FILE: &str = "decision_tree_model.json";
pub const BACKGROUND_DATA_FILE: &str = "train_data.csv";

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub logistic_model: PathBuf,
    pub decision_tree_model: PathBuf,
    pub background_data: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(models_dir: &Path) -> Self {
        Self {
            logistic_model: models_dir.join(LOGISTIC_MODEL_FILE),
            decision_tree_model: models_dir.join(DECISION_TREE_MODEL_FILE),
            background_data: models_dir.join(BACKGROUND_DATA_FILE),
        }
    }

    pub fn model(&self, choice: ModelChoice) -> &Path {
        match choice {
            ModelChoice::LogisticRegression => &self.logistic_model,
            ModelChoice::DecisionTree => &self.decision_tree_model,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PipelineArtifact {
    LogisticRegression(LogisticPipeline),
    DecisionTree(DecisionTreePipeline),
}

impl PipelineArtifact {
    fn choice(&self) -> ModelChoice {
        match self {
            Self::LogisticRegression(_) => ModelChoice::LogisticRegression,
            Self::DecisionTree(_) => ModelChoice::DecisionTree,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Self::LogisticRegression(pipeline) => pipeline.validate(),
            Self::DecisionTree(pipeline) => pipeline.validate(),
        }
    }

    fn into_pipeline(self) -> Arc<dyn PredictionPipeline> {
        match self {
            Self::LogisticRegression(pipeline) => Arc::new(pipeline),
            Self::DecisionTree(pipeline) => Arc::new(pipeline),
        }
    }
}

/// Load and structurally check one serialized pipeline.
///
/// # Errors
/// `Missing` when the file does not exist, `Io` when it cannot be read and
/// `Corrupt` when it does not hold a well-formed pipeline of the expected kind.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_pipeline(
    path: &Path,
    expected: ModelChoice,
) -> Result<Arc<dyn PredictionPipeline>, ArtifactLoadError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactLoadError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let corrupt = |reason: String| ArtifactLoadError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let artifact: PipelineArtifact =
        serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
    if artifact.choice() != expected {
        return Err(corrupt(format!(
            "expected a '{expected}' pipeline, found '{}'",
            artifact.choice()
        )));
    }
    artifact.validate().map_err(corrupt)?;

    let pipeline = artifact.into_pipeline();
    tracing::info!(features = ?pipeline.feature_names(), "Pipeline loaded");
    Ok(pipeline)
}

/// # Errors
/// Fails if either pipeline cannot be loaded.
pub fn load_pipelines(paths: &ArtifactPaths) -> Result<Pipelines, ArtifactLoadError> {
    Ok(Pipelines::new(
        load_pipeline(paths.model(ModelChoice::LogisticRegression), ModelChoice::LogisticRegression)?,
        load_pipeline(paths.model(ModelChoice::DecisionTree), ModelChoice::DecisionTree)?,
    ))
}

/// The background dataset is display-only context: anything short of a
/// readable CSV degrades to an empty table.
pub fn load_background_data(path: &Path) -> Table {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No background dataset, serving an empty one");
        return Table::empty();
    }
    match Table::from_csv_path(path) {
        Ok(table) => {
            tracing::info!(path = %path.display(), rows = table.len(), "Background dataset loaded");
            table
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable background dataset, serving an empty one");
            Table::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FeatureFrame;
    use std::fs;

    const LOGISTIC_JSON: &str = r#"{
        "kind": "logistic_regression",
        "feature_names": ["BMI", "Age", "BMI_Age_Interaction"],
        "scaler": {"mean": [32.0, 33.0, 1080.0], "scale": [7.0, 11.0, 450.0]},
        "coefficients": [0.6, 0.3, 0.2],
        "intercept": -0.8
    }"#;

    const TREE_JSON: &str = r#"{
        "kind": "decision_tree",
        "feature_names": ["Glucose"],
        "children_left": [1, -1, -1],
        "children_right": [2, -1, -1],
        "feature": [0, -2, -2],
        "threshold": [127.5, -2.0, -2.0],
        "value": [[500.0, 268.0], [390.0, 95.0], [110.0, 173.0]]
    }"#;

    #[test]
    fn test_load_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LOGISTIC_MODEL_FILE), LOGISTIC_JSON).unwrap();
        fs::write(dir.path().join(DECISION_TREE_MODEL_FILE), TREE_JSON).unwrap();

        let pipelines = load_pipelines(&ArtifactPaths::in_dir(dir.path())).unwrap();
        let dt = pipelines.get(ModelChoice::DecisionTree);
        assert_eq!(dt.feature_names(), ["Glucose"]);
        let frame = FeatureFrame::from_row([("Glucose", 150.0)]);
        assert_eq!(dt.predict(&frame).unwrap(), vec![1]);
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LOGISTIC_MODEL_FILE), LOGISTIC_JSON).unwrap();

        let err = load_pipelines(&ArtifactPaths::in_dir(dir.path()))
            .err()
            .expect("Should fail without the tree model");
        assert!(matches!(err, ArtifactLoadError::Missing { .. }));
    }

    #[test]
    fn test_corrupt_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOGISTIC_MODEL_FILE);
        fs::write(&path, "not json").unwrap();
        let err = load_pipeline(&path, ModelChoice::LogisticRegression)
            .err()
            .unwrap();
        assert!(matches!(err, ArtifactLoadError::Corrupt { .. }));
    }

    #[test]
    fn test_wrong_kind_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOGISTIC_MODEL_FILE);
        fs::write(&path, TREE_JSON).unwrap();
        let err = load_pipeline(&path, ModelChoice::LogisticRegression)
            .err()
            .unwrap();
        assert!(matches!(err, ArtifactLoadError::Corrupt { .. }));
    }

    #[test]
    fn test_background_data_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_background_data(&dir.path().join(BACKGROUND_DATA_FILE)).is_empty());

        let path = dir.path().join(BACKGROUND_DATA_FILE);
        fs::write(&path, "BMI,Age\n30.5\n").unwrap();
        assert!(load_background_data(&path).is_empty());

        fs::write(&path, "BMI,Age,Outcome\n30.5,40,1\n22.0,25,0\n").unwrap();
        assert_eq!(load_background_data(&path).len(), 2);
    }
}
