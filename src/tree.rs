use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::frame::FeatureFrame;
use crate::pipeline::PredictionPipeline;

const LEAF: i64 = -1;

/// Binary decision tree in flattened array layout: node `i` splits on
/// `feature[i] <= threshold[i]`, leaves have `children_left[i] == -1` and
/// carry per-class weights in `value[i]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTreePipeline {
    pub feature_names: Vec<String>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

impl DecisionTreePipeline {
    pub fn validate(&self) -> Result<(), String> {
        let nodes = self.children_left.len();
        if nodes == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != nodes)
        {
            return Err("node arrays differ in length".to_string());
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {node} has only one child"));
                }
                let [neg, pos] = self.value[node];
                if neg < 0.0 || pos < 0.0 || neg + pos <= 0.0 {
                    return Err(format!("leaf {node} has no class weight"));
                }
                continue;
            }
            // children always come after their parent, which also rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= nodes as i64 {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= self.feature_names.len() {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
        }
        Ok(())
    }

    fn leaf_values(&self, frame: &FeatureFrame) -> Result<Vec<[f64; 2]>> {
        let rows = frame
            .select(&self.feature_names)
            .map_err(|column| anyhow!("feature frame is missing column '{column}'"))?;
        Ok(rows.iter().map(|row| self.value[self.leaf(row)]).collect())
    }

    fn leaf(&self, row: &[f64]) -> usize {
        let mut node = 0;
        while self.children_left[node] != LEAF {
            let x = row[self.feature[node] as usize];
            node = if x <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }
}

impl PredictionPipeline for DecisionTreePipeline {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<u8>> {
        Ok(self
            .leaf_values(frame)?
            .into_iter()
            .map(|[neg, pos]| u8::from(pos > neg))
            .collect())
    }

    fn predict_probability(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        Ok(self
            .leaf_values(frame)?
            .into_iter()
            .map(|[neg, pos]| pos / (neg + pos))
            .collect())
    }
}
