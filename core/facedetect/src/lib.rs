//! Face detection task for visual-workflow hosts.
//!
//! Oversized images are downscaled before inference, a pluggable detector
//! finds faces, and boxes above the confidence threshold are mapped back to
//! source-image pixels.
//!
//! # Example
//!
//! ```no_run
//! use facedetect::{DetectionAdapter, ModelOptions, RustfaceProvider};
//!
//! let adapter = DetectionAdapter::new(
//!     Box::new(RustfaceProvider),
//!     ModelOptions::with_weights_dir("model"),
//! );
//! let image = image::open("group.jpg").unwrap();
//! for face in adapter.run(image).unwrap() {
//!     println!("#{} {:.2} at ({}, {}) {}x{}", face.index, face.confidence, face.x, face.y, face.width, face.height);
//! }
//! ```
#![warn(missing_docs)]

mod adapter;
mod config;
mod error;
/// Detector and provider traits, devices, and raw detections.
pub mod face_detector;
mod precondition;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based detector backend.
pub mod rustface_backend;
mod task;
mod tensor;

/// Lazily built detector plus threshold filtering and rescaling.
pub use adapter::{
    rescale_detections, DetectionAdapter, DetectionRecord, CLASS_NAMES, FACE_CLASS_ID,
};
/// Detection parameters and their host string form.
pub use config::{
    Configuration, ParamMap, DEFAULT_CONFIDENCE_THRESHOLD, PARAM_CONF_THRES, PARAM_CUDA,
};
/// Error type returned by facedetect operations.
pub use error::FaceDetError;
/// Detector capabilities and their inputs and outputs.
pub use face_detector::{DetectorProvider, Device, FaceDetector, ModelOptions, RawDetection};
/// Size budgeting of input images.
pub use precondition::{precondition, ConditionedImage, MAX_SIDE};
#[cfg(feature = "rustface")]
/// Built-in provider that loads the SeetaFace frontal model.
pub use rustface_backend::{RustfaceDetector, RustfaceProvider};
/// Host-facing task capabilities.
pub use task::{
    Configurable, DetectionCollector, FaceDetectionTask, ResultSink, Runnable, TaskInfo,
};
/// Detector input tensors.
pub use tensor::{image_to_tensor, ImageTensor};
