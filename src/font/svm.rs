use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::error::ClassificationError;

use super::FontClassifier;

/// Linear SVM exported as JSON: one weight row and intercept per class
/// (one-vs-rest), or a single row for a two-class model.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearSvmModel {
    coefficients: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

impl LinearSvmModel {
    pub fn load(path: &Path) -> Result<Self, ClassificationError> {
        let model_error = |message: String| ClassificationError::ModelLoad {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|err| model_error(err.to_string()))?;
        let model = Self::from_json(&content).map_err(|err| match err {
            ClassificationError::ModelLoad { message, .. } => model_error(message),
            other => other,
        })?;
        info!(
            path = %path.display(),
            classes = model.class_count(),
            features = model.feature_len(),
            "font model loaded"
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self, ClassificationError> {
        let model: LinearSvmModel =
            serde_json::from_str(content).map_err(|err| ClassificationError::ModelLoad {
                path: "(inline)".to_string(),
                message: err.to_string(),
            })?;
        model.validate()?;
        Ok(model)
    }

    pub fn feature_len(&self) -> usize {
        self.coefficients.first().map(Vec::len).unwrap_or(0)
    }

    pub fn class_count(&self) -> usize {
        if self.coefficients.len() == 1 {
            2
        } else {
            self.coefficients.len()
        }
    }

    fn validate(&self) -> Result<(), ClassificationError> {
        let invalid = |message: &str| ClassificationError::ModelLoad {
            path: "(inline)".to_string(),
            message: message.to_string(),
        };
        if self.coefficients.is_empty() || self.feature_len() == 0 {
            return Err(invalid("model has no coefficients"));
        }
        if self.coefficients.len() != self.intercepts.len() {
            return Err(invalid("coefficient rows and intercepts differ in length"));
        }
        let width = self.feature_len();
        if self.coefficients.iter().any(|row| row.len() != width) {
            return Err(invalid("coefficient rows differ in length"));
        }
        Ok(())
    }
}

impl FontClassifier for LinearSvmModel {
    fn predict(&self, features: &[f32]) -> Result<usize, ClassificationError> {
        let expected = self.feature_len();
        if features.len() != expected {
            return Err(ClassificationError::FeatureLength {
                expected,
                actual: features.len(),
            });
        }

        let scores = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, bias)| dot(row, features) + bias);

        if self.coefficients.len() == 1 {
            let score = scores.sum::<f32>();
            return Ok(usize::from(score > 0.0));
        }

        let mut best = (0usize, f32::NEG_INFINITY);
        for (index, score) in scores.enumerate() {
            if score > best.1 {
                best = (index, score);
            }
        }
        Ok(best.0)
    }
}

fn dot(row: &[f32], features: &[f32]) -> f32 {
    row.iter().zip(features).map(|(w, x)| w * x).sum()
}
