use crate::error::PlateEvalError;
use ndarray::{Array2, Array4, Axis, Ix2};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

/// An onnxruntime inference session for single-output detection models.
///
/// The model takes a (1, 3, h, w) float tensor named `images` and produces a (1, rows, values)
/// tensor.
pub struct OrtInferenceSession {
    session: Session,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> Result<Self, PlateEvalError> {
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| PlateEvalError::detector(format!("loading {}: {}", model_path.display(), e)))?;
        Ok(Self { session })
    }

    /// Runs the model and returns the first output with the batch axis removed.
    pub fn run(&mut self, input: &Array4<f32>) -> Result<Array2<f32>, PlateEvalError> {
        let tensor = TensorRef::from_array_view(input).map_err(PlateEvalError::detector)?;
        let outputs = self
            .session
            .run(inputs!["images" => tensor])
            .map_err(PlateEvalError::detector)?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(PlateEvalError::detector)?;
        if output.ndim() != 3 {
            return Err(PlateEvalError::detector(format!(
                "expected a 3 dimensional output, got shape {:?}",
                output.shape()
            )));
        }
        output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map(|rows| rows.to_owned())
            .map_err(PlateEvalError::detector)
    }
}
