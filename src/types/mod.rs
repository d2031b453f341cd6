//! Type definitions for the churn prediction core

pub mod customer;
pub mod feature;
pub mod prediction;

pub use customer::CustomerRecord;
pub use feature::{FeatureRecord, FeatureValue, TenureBin};
pub use prediction::{ChurnVerdict, PredictionResponse, PredictionResult};
