//! Request boundary: one form submission in, one reply out.

use crate::config::AppConfig;
use crate::error::{ChurnError, Result};
use crate::metrics::ServiceMetrics;
use crate::models::InferenceEngine;
use crate::normalizer::FeatureNormalizer;
use crate::types::{CustomerRecord, PredictionResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Reply to a single submission.
///
/// Per-request failures become `Rejected` so the submitter sees why the
/// record was refused; they never take the service down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceReply {
    Accepted(PredictionResponse),
    Rejected { error_kind: String, message: String },
}

impl ServiceReply {
    pub fn rejected(err: &ChurnError) -> Self {
        ServiceReply::Rejected {
            error_kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ServiceReply::Accepted(_))
    }

    /// Text shown to the submitter.
    pub fn render(&self) -> String {
        match self {
            ServiceReply::Accepted(response) => response.render(),
            ServiceReply::Rejected { message, .. } => format!("Submission rejected: {message}"),
        }
    }
}

/// Normalizes and scores customer records.
pub struct PredictionService {
    normalizer: FeatureNormalizer,
    engine: InferenceEngine,
    metrics: Arc<ServiceMetrics>,
    include_features: bool,
}

impl PredictionService {
    pub fn new(
        normalizer: FeatureNormalizer,
        engine: InferenceEngine,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            normalizer,
            engine,
            metrics,
            include_features: true,
        }
    }

    /// Build the service from configuration, loading the classifier.
    ///
    /// Fails with [`ChurnError::FatalLoad`] when the artifact cannot be
    /// loaded; no request can be served in that case.
    pub fn from_config(config: &AppConfig, metrics: Arc<ServiceMetrics>) -> Result<Self> {
        let engine = InferenceEngine::from_config(&config.model)?;
        let normalizer = FeatureNormalizer::new(config.validation.range_policy);
        Ok(Self::new(normalizer, engine, metrics).with_features(config.service.include_features))
    }

    /// Whether replies echo the normalized record.
    pub fn with_features(mut self, include: bool) -> Self {
        self.include_features = include;
        self
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Normalize and score one customer record.
    pub fn predict(&self, record: CustomerRecord) -> Result<PredictionResponse> {
        let features = self.normalizer.normalize_checked(record)?;
        let result = self.engine.predict(&features)?;

        let response = PredictionResponse::new(result);
        Ok(if self.include_features {
            response.with_features(features)
        } else {
            response
        })
    }

    /// Handle a raw JSON submission.
    pub fn handle_payload(&self, payload: &[u8]) -> ServiceReply {
        let start = Instant::now();

        let outcome = serde_json::from_slice::<CustomerRecord>(payload)
            .map_err(|e| ChurnError::InvalidRequest(e.to_string()))
            .and_then(|record| self.predict(record));

        match outcome {
            Ok(response) => {
                self.metrics
                    .record_prediction(start.elapsed(), response.probability, response.label);
                debug!(
                    request_id = %response.request_id,
                    label = response.label,
                    probability = response.probability,
                    "Submission scored"
                );
                ServiceReply::Accepted(response)
            }
            Err(e) => {
                self.metrics.record_rejection(e.kind(), start.elapsed());
                warn!(kind = e.kind(), error = %e, "Submission rejected");
                ServiceReply::rejected(&e)
            }
        }
    }
}
