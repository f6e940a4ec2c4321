//! ONNX Runtime session for the frozen feature backbone.
//!
//! The exported model is an ImageNet classifier with its last classification
//! layer removed, so its first output is the penultimate activation vector.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::PipelineError;

/// Wraps an ONNX Runtime session for backbone inference.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct BackboneSession {
    session: Mutex<Session>,
    input_name: String,
}

impl BackboneSession {
    /// Load the backbone from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        let session = Session::builder()
            .map_err(|e| PipelineError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Loaded backbone from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run inference on one preprocessed tensor and return its feature vector.
    ///
    /// Input shape: \[1, 3, size, size\]. The vector is returned as produced,
    /// without normalization.
    pub fn run(&self, preprocessed: &Array4<f32>, sample_id: &str) -> Result<Vec<f32>, PipelineError> {
        let extraction_error = |message: String| PipelineError::Extraction {
            sample_id: sample_id.to_string(),
            message,
        };

        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| extraction_error(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| extraction_error(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| extraction_error(format!("ONNX inference failed: {e}")))?;

        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| extraction_error("Model produced no outputs".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| extraction_error(format!("Failed to extract feature tensor: {e}")))?;

        feature_vector(shape, data).map_err(extraction_error)
    }
}

/// Take the feature vector out of a `[dim]` or `[1, dim]` output tensor.
fn feature_vector(shape: &[i64], data: &[f32]) -> Result<Vec<f32>, String> {
    match shape {
        [_] => Ok(data.to_vec()),
        [_, dim] => {
            let dim = usize::try_from(*dim).map_err(|_| format!("Invalid feature dimension {dim}"))?;
            data.get(..dim)
                .map(<[f32]>::to_vec)
                .ok_or_else(|| format!("Feature tensor {shape:?} holds {} values", data.len()))
        }
        _ => Err(format!("Unexpected feature shape: {shape:?}")),
    }
}
