//! Inference engine for churn prediction

use crate::config::ModelConfig;
use crate::error::{ChurnError, Result};
use crate::models::classifier::ChurnClassifier;
use crate::models::loader::ModelLoader;
use crate::schema::FeatureSchema;
use crate::types::{FeatureRecord, PredictionResult};
use anyhow::anyhow;
use std::sync::Arc;
use tracing::{debug, info};

/// Default decision threshold on the class-1 probability.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Scores normalized feature records against the loaded classifier.
///
/// Built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct InferenceEngine {
    classifier: Arc<dyn ChurnClassifier>,
    schema: Arc<FeatureSchema>,
    threshold: f64,
}

impl InferenceEngine {
    /// Create an engine around an already loaded classifier.
    pub fn new(classifier: Arc<dyn ChurnClassifier>, schema: FeatureSchema, threshold: f64) -> Self {
        Self {
            classifier,
            schema: Arc::new(schema),
            threshold,
        }
    }

    /// Load schema and classifier artifact from configuration.
    ///
    /// Any failure is a [`ChurnError::FatalLoad`].
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(ChurnError::fatal_load(
                &config.artifact_path,
                format!("decision threshold {} outside [0, 1]", config.threshold),
            ));
        }

        let schema = match &config.schema_path {
            Some(path) => FeatureSchema::from_json_file(path)?,
            None => FeatureSchema::telco_v1(),
        };

        let classifier =
            ModelLoader::with_threads(config.onnx_threads).load(&config.artifact_path, &schema)?;

        info!(
            model = %classifier.name(),
            schema = %schema.version,
            encoded_width = schema.width(),
            threshold = config.threshold,
            "Inference engine initialized"
        );

        Ok(Self::new(classifier, schema, config.threshold))
    }

    /// Decision threshold: label is 1 iff the probability exceeds it.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Score one feature record.
    ///
    /// Values outside the trained vocabulary are rejected with
    /// [`ChurnError::SchemaMismatch`] before the classifier is called.
    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult> {
        let row = self.schema.encode(record)?;
        let probability = self.classifier.predict_proba(&row)?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(ChurnError::Inference(anyhow!(
                "classifier {} returned probability {} outside [0, 1]",
                self.classifier.name(),
                probability
            )));
        }

        let result = PredictionResult::from_probability(probability, self.threshold);

        debug!(
            model = %self.classifier.name(),
            tenure_bin = %record.tenure_bin,
            probability = probability,
            label = result.label,
            "Prediction complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::types::CustomerRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed probability and counts calls.
    struct FixedClassifier {
        probability: f64,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(probability: f64) -> Arc<Self> {
            Arc::new(Self {
                probability,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ChurnClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_proba(&self, _row: &[f32]) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.probability)
        }
    }

    fn engine(probability: f64, threshold: f64) -> (InferenceEngine, Arc<FixedClassifier>) {
        let classifier = FixedClassifier::new(probability);
        let engine = InferenceEngine::new(classifier.clone(), FeatureSchema::telco_v1(), threshold);
        (engine, classifier)
    }

    #[test]
    fn test_label_is_strictly_above_threshold() {
        let record = normalize(CustomerRecord::default());

        let (e, _) = engine(0.5, 0.5);
        assert_eq!(e.predict(&record).unwrap().label, 0);

        let (e, _) = engine(0.5001, 0.5);
        assert_eq!(e.predict(&record).unwrap().label, 1);

        let (e, _) = engine(0.3, 0.25);
        assert_eq!(e.predict(&record).unwrap().label, 1);
    }

    #[test]
    fn test_schema_mismatch_skips_classifier() {
        let (e, classifier) = engine(0.9, 0.5);
        let mut record = normalize(CustomerRecord::default());
        record.internet_service = "Satellite".to_string();

        let err = e.predict(&record).unwrap_err();
        assert!(matches!(err, ChurnError::SchemaMismatch { .. }));
        assert_eq!(classifier.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_one_classifier_call_per_prediction() {
        let (e, classifier) = engine(0.7, 0.5);
        let record = normalize(CustomerRecord::default());

        let result = e.predict(&record).unwrap();
        assert_eq!(result.probability, 0.7);
        assert_eq!(classifier.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let record = normalize(CustomerRecord::default());
        for bad in [1.2, -0.1, f64::NAN] {
            let (e, _) = engine(bad, 0.5);
            let err = e.predict(&record).unwrap_err();
            assert_eq!(err.kind(), "inference");
        }
    }

    #[test]
    fn test_from_config_missing_artifact_is_fatal() {
        let config = ModelConfig {
            artifact_path: "/nonexistent/churn_classifier.onnx".into(),
            ..ModelConfig::default()
        };
        let err = InferenceEngine::from_config(&config).err().unwrap();
        assert!(matches!(err, ChurnError::FatalLoad { .. }));
    }

    #[test]
    fn test_from_config_rejects_threshold_outside_unit_interval() {
        let config = ModelConfig {
            threshold: 1.5,
            ..ModelConfig::default()
        };
        let err = InferenceEngine::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("threshold"));
    }
}
