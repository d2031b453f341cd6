//! Classifier artifacts and inference

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod logistic;
pub mod onnx;

pub use classifier::ChurnClassifier;
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
