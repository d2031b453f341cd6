//! Prediction results and their rendering

use crate::types::FeatureRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary churn decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnVerdict {
    Churn,
    NotChurn,
}

impl ChurnVerdict {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            ChurnVerdict::Churn
        } else {
            ChurnVerdict::NotChurn
        }
    }

    /// Message shown to the person who submitted the form.
    pub fn message(&self) -> &'static str {
        match self {
            ChurnVerdict::Churn => "Prediction: CHURN (Yes)",
            ChurnVerdict::NotChurn => "Prediction: NOT CHURN (No)",
        }
    }
}

/// Outcome of scoring one feature record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 = churn, 0 = no churn
    pub label: u8,
    /// Class-1 probability, uncalibrated
    pub probability: f64,
}

impl PredictionResult {
    /// Apply the decision threshold: churn iff the probability exceeds it.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        Self {
            label: u8::from(probability > threshold),
            probability,
        }
    }

    pub fn verdict(&self) -> ChurnVerdict {
        ChurnVerdict::from_label(self.label)
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.verdict().message())?;
        write!(f, "Churn Probability (Class 1): {:.4}", self.probability)
    }
}

/// Reply sent back for an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub request_id: String,
    pub label: u8,
    pub probability: f64,
    pub verdict: ChurnVerdict,
    pub message: String,
    /// Normalized record as scored, when echoing is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureRecord>,
    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn new(result: PredictionResult) -> Self {
        let verdict = result.verdict();
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            label: result.label,
            probability: result.probability,
            verdict,
            message: verdict.message().to_string(),
            features: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the normalized record for inspection.
    pub fn with_features(mut self, features: FeatureRecord) -> Self {
        self.features = Some(features);
        self
    }

    pub fn result(&self) -> PredictionResult {
        PredictionResult {
            label: self.label,
            probability: self.probability,
        }
    }

    /// Human-readable rendering: verdict, probability and, when present,
    /// the normalized record as a two-column table.
    pub fn render(&self) -> String {
        let mut out = self.result().to_string();
        if let Some(features) = &self.features {
            out.push_str("\n\n");
            out.push_str(&render_features(features));
        }
        out
    }
}

/// Two-column table of a normalized record.
pub fn render_features(features: &FeatureRecord) -> String {
    let columns = features.columns();
    let width = columns.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    columns
        .iter()
        .map(|(name, value)| format!("{name:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::types::CustomerRecord;

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(PredictionResult::from_probability(0.5, 0.5).label, 0);
        assert_eq!(PredictionResult::from_probability(0.51, 0.5).label, 1);
        assert_eq!(PredictionResult::from_probability(0.0, 0.0).label, 0);
    }

    #[test]
    fn test_display_uses_four_decimals() {
        let churn = PredictionResult::from_probability(0.87654, 0.5);
        assert_eq!(
            churn.to_string(),
            "Prediction: CHURN (Yes)\nChurn Probability (Class 1): 0.8765"
        );

        let stay = PredictionResult::from_probability(0.05, 0.5);
        assert_eq!(
            stay.to_string(),
            "Prediction: NOT CHURN (No)\nChurn Probability (Class 1): 0.0500"
        );
    }

    #[test]
    fn test_response_serialization() {
        let features = normalize(CustomerRecord::new(1, 95.0, 95.0));
        let response =
            PredictionResponse::new(PredictionResult::from_probability(0.8, 0.5)).with_features(features);

        let json = serde_json::to_string(&response).unwrap();
        let back: PredictionResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(back.request_id, response.request_id);
        assert_eq!(back.verdict, ChurnVerdict::Churn);
        assert_eq!(back.features.unwrap().tenure_bin, "0-12");
        assert!(json.contains("\"verdict\":\"churn\""));
    }

    #[test]
    fn test_render_includes_feature_table() {
        let features = normalize(CustomerRecord::new(30, 42.0, 1260.0));
        let response =
            PredictionResponse::new(PredictionResult::from_probability(0.2, 0.5)).with_features(features);

        let text = response.render();
        assert!(text.starts_with("Prediction: NOT CHURN (No)"));
        assert!(text.contains("Churn Probability (Class 1): 0.2000"));
        assert!(text.lines().any(|l| l.starts_with("tenure_bin") && l.ends_with("25-36")));
        assert!(text.lines().any(|l| l.starts_with("PaymentMethod") && l.ends_with("Electronic check")));
    }
}
