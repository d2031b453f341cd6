//! Classifier abstraction shared by every artifact backend

use crate::error::Result;

/// A loaded, read-only binary churn classifier.
///
/// Implementations take one encoded row laid out by the
/// [`FeatureSchema`](crate::schema::FeatureSchema) and return the class-1
/// probability. Deciding the label is left to the caller.
pub trait ChurnClassifier: Send + Sync {
    /// Backend or artifact name, for logging.
    fn name(&self) -> &str;

    /// Class-1 probability for a single encoded row.
    fn predict_proba(&self, row: &[f32]) -> Result<f64>;
}
