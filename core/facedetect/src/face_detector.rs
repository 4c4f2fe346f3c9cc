use std::fmt;
use std::path::PathBuf;

use crate::error::FaceDetError;
use crate::tensor::ImageTensor;

/// One face reported by a detector, in the coordinates of the image it was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    /// Detection confidence in `0.0..=1.0`.
    pub confidence: f32,
    /// `(x, y)` of the top-left corner (pixels).
    pub top_left: (f32, f32),
    /// `(x, y)` of the bottom-right corner (pixels).
    pub bottom_right: (f32, f32),
}

/// Compute device a detector is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// Host CPU.
    #[default]
    Cpu,
    /// Accelerator with the given ordinal.
    Cuda(usize),
}

impl Device {
    /// Whether this device is an accelerator.
    pub fn is_accelerator(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}

/// Options handed to a provider when it builds a detector.
///
/// Weight locations travel with each construction call instead of living in
/// process-wide state.
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// Directory holding pretrained weights. Providers fall back to their own
    /// default location when `None`.
    pub weights_dir: Option<PathBuf>,
}

impl ModelOptions {
    /// Options pointing at an explicit weights directory.
    pub fn with_weights_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            weights_dir: Some(dir.into()),
        }
    }
}

/// A constructed, device-bound face detector.
///
/// Implement this trait to plug in a detection engine (ONNX, Burn, SeetaFace,
/// ...). Detectors are inference-only: they hold no training state and must
/// not mutate themselves across calls.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a `[1, C, H, W]` tensor. Results keep the engine's order.
    fn infer(&self, input: &ImageTensor) -> Result<Vec<RawDetection>, FaceDetError>;
}

/// Builds detectors for a device. This is the pretrained-model capability.
pub trait DetectorProvider: Send + Sync {
    /// Whether an accelerator device can be used by this provider.
    fn accelerator_available(&self) -> bool;

    /// Construct a detector bound to `device`.
    fn construct(
        &self,
        device: Device,
        options: &ModelOptions,
    ) -> Result<Box<dyn FaceDetector>, FaceDetError>;
}
