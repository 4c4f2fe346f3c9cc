use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::debug;

use crate::error::FaceDetError;
use crate::face_detector::{DetectorProvider, Device, FaceDetector, ModelOptions, RawDetection};
use crate::tensor::ImageTensor;

/// File name of the SeetaFace frontal model inside the weights directory.
pub const MODEL_FILE: &str = "seeta_fd_frontal_v1.0.bin";

/// Environment variable naming the default weights directory.
pub const WEIGHTS_DIR_ENV: &str = "FACEDETECT_WEIGHTS_DIR";

/// Raw SeetaFace score below which windows are discarded inside the engine.
/// A score of 0.0 maps to a confidence of 0.5.
const SCORE_THRESH: f64 = 0.0;

/// Builds [`RustfaceDetector`]s. SeetaFace runs on the CPU only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustfaceProvider;

impl RustfaceProvider {
    fn model_path(options: &ModelOptions) -> PathBuf {
        let dir = options
            .weights_dir
            .clone()
            .or_else(|| std::env::var_os(WEIGHTS_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("model"));
        dir.join(MODEL_FILE)
    }
}

impl DetectorProvider for RustfaceProvider {
    fn accelerator_available(&self) -> bool {
        false
    }

    fn construct(
        &self,
        device: Device,
        options: &ModelOptions,
    ) -> Result<Box<dyn FaceDetector>, FaceDetError> {
        let path = Self::model_path(options);
        debug!(path = %path.display(), %device, "loading SeetaFace model");
        let file = File::open(&path).map_err(|source| FaceDetError::ModelLoad {
            path: path.clone(),
            source,
        })?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|source| FaceDetError::ModelLoad { path, source })?;
        Ok(Box::new(RustfaceDetector { model }))
    }
}

/// Face detector backed by the `rustface` crate (SeetaFace engine).
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl FaceDetector for RustfaceDetector {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<RawDetection>, FaceDetError> {
        let (width, height) = (input.width() as u32, input.height() as u32);
        let gray = input.to_luma8();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(SCORE_THRESH);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(&gray, width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                let (x, y) = (bbox.x() as f32, bbox.y() as f32);
                RawDetection {
                    confidence: score_to_confidence(face.score()),
                    top_left: (x, y),
                    bottom_right: (x + bbox.width() as f32, y + bbox.height() as f32),
                }
            })
            .collect())
    }
}

/// Squash an unbounded SeetaFace score into `0.0..=1.0`.
fn score_to_confidence(score: f64) -> f32 {
    (1.0 / (1.0 + (-score).exp())) as f32
}
