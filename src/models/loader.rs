//! Classifier artifact loader

use crate::error::{ChurnError, Result};
use crate::models::classifier::ChurnClassifier;
use crate::models::logistic::{LogisticArtifact, LogisticClassifier};
use crate::models::onnx::OnnxClassifier;
use crate::schema::FeatureSchema;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Artifact formats the loader understands, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// `.onnx`: exported model run through ONNX Runtime
    Onnx,
    /// `.json`: logistic regression coefficients
    LogisticJson,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "onnx" => Some(Self::Onnx),
            "json" => Some(Self::LogisticJson),
            _ => None,
        }
    }
}

/// Loads the classifier artifact once at startup.
///
/// Every failure here is a [`ChurnError::FatalLoad`]: there is no fallback
/// model and no degraded mode.
pub struct ModelLoader {
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a loader with default settings (1 ONNX thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the artifact at `path`, checked against `schema`.
    pub fn load<P: AsRef<Path>>(
        &self,
        path: P,
        schema: &FeatureSchema,
    ) -> Result<Arc<dyn ChurnClassifier>> {
        let path = path.as_ref();
        let result = self.load_inner(path, schema);

        match &result {
            Ok(model) => info!(
                model = %model.name(),
                path = %path.display(),
                schema = %schema.version,
                "Classifier artifact loaded"
            ),
            Err(e) => error!(path = %path.display(), error = %e, "Classifier artifact failed to load"),
        }

        result
    }

    fn load_inner(&self, path: &Path, schema: &FeatureSchema) -> Result<Arc<dyn ChurnClassifier>> {
        if !path.is_file() {
            return Err(ChurnError::fatal_load(path, "artifact file not found"));
        }

        let format = ArtifactFormat::from_path(path).ok_or_else(|| {
            ChurnError::fatal_load(path, "unsupported artifact format (expected .onnx or .json)")
        })?;
        let name = artifact_name(path);

        match format {
            ArtifactFormat::Onnx => {
                let model = OnnxClassifier::load(path, &name, self.onnx_threads, schema.width())
                    .map_err(|e| ChurnError::fatal_load(path, format!("{e:#}")))?;
                Ok(Arc::new(model))
            }
            ArtifactFormat::LogisticJson => {
                let raw =
                    std::fs::read_to_string(path).map_err(|e| ChurnError::fatal_load(path, e))?;
                let artifact: LogisticArtifact =
                    serde_json::from_str(&raw).map_err(|e| ChurnError::fatal_load(path, e))?;
                let model = LogisticClassifier::from_artifact(&name, artifact, schema)
                    .map_err(|reason| ChurnError::fatal_load(path, reason))?;
                Ok(Arc::new(model))
            }
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn artifact_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("classifier")
        .to_string()
}
