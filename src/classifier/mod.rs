pub mod onnx;
pub mod traits;
#[cfg(test)]
pub mod mock;

pub use onnx::{Device, OnnxClassifier};
pub use traits::TokenClassifier;

#[derive(Debug)]
pub enum InferenceError {
    /// The model could not be loaded or run.
    Unavailable(String),
    /// The model ran but its output does not have the expected shape.
    Malformed(String),
    InvalidInput(String),
}

impl InferenceError {
    pub(crate) fn unavailable(err: impl std::fmt::Display) -> Self {
        InferenceError::Unavailable(err.to_string())
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        InferenceError::Malformed(err.to_string())
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::Unavailable(msg) => write!(f, "inference unavailable: {msg}"),
            InferenceError::Malformed(msg) => write!(f, "malformed inference output: {msg}"),
            InferenceError::InvalidInput(msg) => write!(f, "invalid inference input: {msg}"),
        }
    }
}

impl std::error::Error for InferenceError {}
