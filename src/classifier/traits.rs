use ndarray::Array2;

use super::InferenceError;

/// Token-classification model: one score row per input position.
pub trait TokenClassifier {
    fn num_labels(&self) -> usize;

    /// Scores of shape `(ids.len(), num_labels())` for a single unpadded sequence.
    fn infer(&mut self, ids: &[i64], attention_mask: &[i64]) -> Result<Array2<f32>, InferenceError>;
}
