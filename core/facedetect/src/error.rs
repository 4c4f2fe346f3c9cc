use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by configuration, preconditioning, and detection.
#[derive(Debug, Error)]
pub enum FaceDetError {
    /// Threshold outside `0.0..=1.0`.
    #[error("confidence threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f32),

    /// Required host parameter absent.
    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    /// Host parameter could not be parsed.
    #[error("invalid value {value:?} for parameter `{key}`")]
    #[allow(missing_docs)]
    InvalidParameter { key: String, value: String },

    /// Input image has zero width or height.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// Input bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    /// Detector weights could not be read.
    #[error("failed to load model weights from {}: {source}", .path.display())]
    ModelLoad {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The detector reported a fault.
    #[error("inference failed: {0}")]
    Inference(String),
}
