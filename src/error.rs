use thiserror::Error;

/// Errors raised while configuring, initializing or persisting a network.
///
/// Numerical problems (NaN/Inf from an unstable learning rate) are not
/// reported here; they propagate through the matrices unchanged.
#[derive(Debug, Error)]
pub enum NeuralNetError {
    #[error("last layer must be a {expected} layer, was {actual}")]
    MissingCapability {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("shape mismatch at layer {index} ({layer}): {message}")]
    ShapeMismatch {
        index: usize,
        layer: &'static str,
        message: String,
    },

    #[error("{layer} layer has no parameters or gradients")]
    NotApplicable { layer: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NeuralNetError>;
