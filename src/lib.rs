//! Telecom Churn Prediction Library
//!
//! Normalizes telecom customer attributes into the feature record a
//! pre-trained churn classifier expects, validates it against an explicit
//! versioned schema and scores it, returning a churn label and the class-1
//! probability.

pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod producer;
pub mod schema;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use error::{ChurnError, Result};
pub use models::inference::InferenceEngine;
pub use normalizer::{normalize, tenure_to_bin, FeatureNormalizer};
pub use schema::FeatureSchema;
pub use service::{PredictionService, ServiceReply};
pub use types::{CustomerRecord, FeatureRecord, PredictionResponse, PredictionResult, TenureBin};
