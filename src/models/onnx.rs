//! ONNX Runtime backed churn classifier

use crate::error::{ChurnError, Result};
use crate::models::classifier::ChurnClassifier;
use anyhow::{anyhow, Context};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier exported to ONNX, fed one `[1, width]` float row.
pub struct OnnxClassifier {
    name: String,
    /// The runtime needs exclusive access per run; the model itself is
    /// never modified after load.
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load an ONNX model file into a new session.
    ///
    /// `width` is the encoded row width of the schema; a model whose input
    /// declares a different static width is rejected.
    pub fn load<P: AsRef<Path>>(
        path: P,
        name: &str,
        threads: usize,
        width: usize,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| anyhow!("model declares no inputs"))?;
        if let Some(shape) = input.input_type.tensor_shape() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            check_input_width(&dims, width).map_err(|e| anyhow!("input {}: {}", input.name, e))?;
        }
        let input_name = input.name.clone();

        // sklearn-style exports emit `label` and `probabilities`; prefer the latter.
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("model declares no outputs"))?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            threads = threads,
            "ONNX model loaded"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    fn run(&self, row: &[f32]) -> anyhow::Result<f64> {
        let shape = vec![1_i64, row.len() as i64];
        let input = Tensor::from_array((shape, row.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input])?;

        self.extract_probability(&outputs)
    }

    /// Pull the class-1 probability out of the session outputs.
    ///
    /// Handles plain tensors (`[1, 2]` or `[1, 1]`) and the
    /// `seq(map(int64, float))` shape produced by some converters.
    fn extract_probability(&self, outputs: &ort::session::SessionOutputs) -> anyhow::Result<f64> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(prob) = Self::probability_from_value(&output, &self.name)? {
                return Ok(prob);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = Self::probability_from_value(&output, &self.name)? {
                debug!(model = %self.name, output = %name, "Probability read from fallback output");
                return Ok(prob);
            }
        }

        Err(anyhow!("no probability output found on model {}", self.name))
    }

    fn probability_from_value(
        output: &ort::value::DynValue,
        model_name: &str,
    ) -> anyhow::Result<Option<f64>> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Ok(class_one_from_tensor(&dims, data));
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            let allocator = Allocator::default();
            let sequence = output
                .downcast_ref::<DynSequenceValueType>()
                .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;
            let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
            let first = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;
            let pairs = first.try_extract_key_values::<i64, f32>()?;

            debug!(model = %model_name, classes = pairs.len(), "Probability read from seq(map)");
            return Ok(class_one_from_map(&pairs));
        }

        Ok(None)
    }
}

/// Compare a declared input shape with the encoded row width.
///
/// Symbolic dimensions are reported as negative and are not checked.
fn check_input_width(dims: &[i64], width: usize) -> std::result::Result<(), String> {
    match dims.last() {
        Some(&n) if n > 0 && n as usize != width => Err(format!(
            "model expects {n} features per row, schema encodes {width}"
        )),
        _ => Ok(()),
    }
}

/// Class-1 probability from a single-row tensor.
fn class_one_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [1, n] | [n] => *n,
        _ => return None,
    };
    match classes {
        n if n >= 2 => data.get(1).map(|&p| p as f64),
        1 => data.first().map(|&p| p as f64),
        _ => None,
    }
}

/// Class-1 probability from a class-id to probability map.
fn class_one_from_map(pairs: &[(i64, f32)]) -> Option<f64> {
    pairs
        .iter()
        .find(|(class, _)| *class == 1)
        .map(|&(_, p)| p as f64)
        .or_else(|| {
            pairs
                .iter()
                .find(|(class, _)| *class == 0)
                .map(|&(_, p)| 1.0 - p as f64)
        })
}

impl ChurnClassifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, row: &[f32]) -> Result<f64> {
        self.run(row).map_err(ChurnError::Inference)
    }
}
