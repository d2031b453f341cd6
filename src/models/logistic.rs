//! Logistic regression classifier loaded from a JSON artifact.
//!
//! Coefficients are keyed by encoded column name (see
//! [`FeatureSchema::feature_names`]), so an artifact only needs to list the
//! columns it actually weights.

use crate::error::{ChurnError, Result};
use crate::models::classifier::ChurnClassifier;
use crate::schema::FeatureSchema;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Mean and scale applied to a column before weighting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Standardization {
    pub mean: f64,
    pub scale: f64,
}

/// Serialized form of a logistic regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    /// Schema version the model was fitted against, checked at load.
    #[serde(default)]
    pub schema_version: Option<String>,
    pub intercept: f64,
    /// Coefficient per encoded column name.
    pub weights: BTreeMap<String, f64>,
    /// Optional per-column standardization.
    #[serde(default)]
    pub standardize: BTreeMap<String, Standardization>,
}

/// Dense logistic regression over an encoded row.
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    name: String,
    intercept: f64,
    coefficients: Vec<f64>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl LogisticClassifier {
    /// Align an artifact with the schema's encoded layout.
    ///
    /// Fails if the artifact names a column the schema does not produce,
    /// declares a different schema version, or carries a non-positive scale.
    pub fn from_artifact(
        name: &str,
        artifact: LogisticArtifact,
        schema: &FeatureSchema,
    ) -> std::result::Result<Self, String> {
        if let Some(version) = &artifact.schema_version {
            if *version != schema.version {
                return Err(format!(
                    "artifact fitted on schema {version}, runtime schema is {}",
                    schema.version
                ));
            }
        }

        let names = schema.feature_names();
        let index: HashMap<&str, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut coefficients = vec![0.0; names.len()];
        for (column, weight) in &artifact.weights {
            let i = *index
                .get(column.as_str())
                .ok_or_else(|| format!("weight for unknown column {column:?}"))?;
            coefficients[i] = *weight;
        }

        let mut means = vec![0.0; names.len()];
        let mut scales = vec![1.0; names.len()];
        for (column, std) in &artifact.standardize {
            let i = *index
                .get(column.as_str())
                .ok_or_else(|| format!("standardization for unknown column {column:?}"))?;
            if !(std.scale.is_finite() && std.scale > 0.0) {
                return Err(format!("non-positive scale for column {column:?}"));
            }
            means[i] = std.mean;
            scales[i] = std.scale;
        }

        Ok(Self {
            name: name.to_string(),
            intercept: artifact.intercept,
            coefficients,
            means,
            scales,
        })
    }

    /// Linear score before the sigmoid.
    pub fn logit(&self, row: &[f32]) -> f64 {
        let dot: f64 = row
            .iter()
            .zip(&self.coefficients)
            .zip(self.means.iter().zip(&self.scales))
            .map(|((&x, &w), (&mean, &scale))| w * (x as f64 - mean) / scale)
            .sum();
        self.intercept + dot
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ChurnClassifier for LogisticClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, row: &[f32]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(ChurnError::Inference(anyhow!(
                "row has {} columns, model expects {}",
                row.len(),
                self.coefficients.len()
            )));
        }
        Ok(sigmoid(self.logit(row)))
    }
}
