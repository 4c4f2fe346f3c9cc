use image::DynamicImage;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::error::FaceDetError;
use crate::face_detector::{DetectorProvider, Device, FaceDetector, ModelOptions, RawDetection};
use crate::precondition::{precondition, ConditionedImage, MAX_SIDE};
use crate::tensor::image_to_tensor;

/// Class id of every record; the detector knows a single class.
pub const FACE_CLASS_ID: u32 = 0;
/// Class names reported to result sinks.
pub const CLASS_NAMES: [&str; 1] = ["face"];

/// A face in source-image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    /// 1-based position of the detection in the detector output.
    pub index: usize,
    /// Always [`FACE_CLASS_ID`].
    pub class_id: u32,
    /// Detector confidence.
    pub confidence: f32,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

enum ModelState {
    Uninitialized,
    Ready {
        device: Device,
        detector: Box<dyn FaceDetector>,
    },
}

/// Owns the detector and turns raw images into [`DetectionRecord`]s.
///
/// The model is built lazily on the first run and rebuilt whenever the
/// configuration is marked dirty.
pub struct DetectionAdapter {
    provider: Box<dyn DetectorProvider>,
    options: ModelOptions,
    config: Mutex<Configuration>,
    model: RwLock<ModelState>,
}

impl DetectionAdapter {
    /// Create an adapter. Accelerator use defaults to whatever the provider offers.
    pub fn new(provider: Box<dyn DetectorProvider>, options: ModelOptions) -> Self {
        let config = Configuration {
            use_accelerator: provider.accelerator_available(),
            ..Configuration::default()
        };
        Self {
            provider,
            options,
            config: Mutex::new(config),
            model: RwLock::new(ModelState::Uninitialized),
        }
    }

    /// Snapshot of the current configuration.
    pub fn configuration(&self) -> Configuration {
        self.config.lock().clone()
    }

    /// Replace the configuration. The model is rebuilt on the next run.
    pub fn set_configuration(&self, mut config: Configuration) -> Result<(), FaceDetError> {
        config.validate()?;
        config.dirty = true;
        *self.config.lock() = config;
        Ok(())
    }

    /// Device of the bound model, if one has been built.
    pub fn device(&self) -> Option<Device> {
        match &*self.model.read() {
            ModelState::Uninitialized => None,
            ModelState::Ready { device, .. } => Some(*device),
        }
    }

    /// Build the model if missing or stale; returns the threshold to use for this run.
    fn ensure_ready(&self) -> Result<f32, FaceDetError> {
        let mut config = self.config.lock();
        let mut model = self.model.write();

        if config.dirty || matches!(*model, ModelState::Uninitialized) {
            let device = self.resolve_device(config.use_accelerator);
            let detector = self.provider.construct(device, &self.options)?;
            *model = ModelState::Ready { device, detector };
            config.dirty = false;
            info!("face detector will run on {device}");
        }

        Ok(config.confidence_threshold)
    }

    fn resolve_device(&self, use_accelerator: bool) -> Device {
        if !use_accelerator {
            return Device::Cpu;
        }
        if self.provider.accelerator_available() {
            Device::Cuda(0)
        } else {
            warn!("accelerator requested but unavailable, falling back to cpu");
            Device::Cpu
        }
    }

    /// Detect faces in `image` and return them in source-image coordinates.
    pub fn run(&self, image: DynamicImage) -> Result<Vec<DetectionRecord>, FaceDetError> {
        let threshold = self.ensure_ready()?;
        let conditioned = precondition(image, MAX_SIDE)?;

        let raw = {
            let model = self.model.read();
            let ModelState::Ready { device, detector } = &*model else {
                return Err(FaceDetError::Inference("detector is not initialized".into()));
            };
            let tensor = image_to_tensor(&conditioned.pixels, *device);
            detector.infer(&tensor)?
        };

        let records = rescale_detections(&raw, &conditioned, threshold);
        debug!(
            raw = raw.len(),
            kept = records.len(),
            threshold,
            "face detection finished"
        );
        Ok(records)
    }
}

/// Drop detections below `threshold` and map the rest onto the source image.
///
/// Corners are truncated to whole scaled pixels before rescaling. Indices
/// follow detector order, so filtered detections leave gaps.
pub fn rescale_detections(
    raw: &[RawDetection],
    conditioned: &ConditionedImage,
    threshold: f32,
) -> Vec<DetectionRecord> {
    raw.iter()
        .enumerate()
        .filter(|(_, det)| det.confidence >= threshold)
        .map(|(i, det)| {
            let (x1, y1) = conditioned.to_original(det.top_left.0.trunc(), det.top_left.1.trunc());
            let (x2, y2) =
                conditioned.to_original(det.bottom_right.0.trunc(), det.bottom_right.1.trunc());
            DetectionRecord {
                index: i + 1,
                class_id: FACE_CLASS_ID,
                confidence: det.confidence,
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn det(confidence: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> RawDetection {
        RawDetection {
            confidence,
            top_left: (x1, y1),
            bottom_right: (x2, y2),
        }
    }

    fn conditioned(width_ratio: f32, height_ratio: f32) -> ConditionedImage {
        ConditionedImage {
            pixels: DynamicImage::ImageRgb8(RgbImage::new(1, 1)),
            original_width: 1,
            original_height: 1,
            scaled_width: 1,
            scaled_height: 1,
            width_ratio,
            height_ratio,
        }
    }

    struct FixedDetector(Vec<RawDetection>);

    impl FaceDetector for FixedDetector {
        fn infer(&self, _input: &crate::ImageTensor) -> Result<Vec<RawDetection>, FaceDetError> {
            Ok(self.0.clone())
        }
    }

    struct CountingProvider {
        builds: Arc<AtomicUsize>,
        accelerator: bool,
    }

    impl DetectorProvider for CountingProvider {
        fn accelerator_available(&self) -> bool {
            self.accelerator
        }

        fn construct(
            &self,
            _device: Device,
            _options: &ModelOptions,
        ) -> Result<Box<dyn FaceDetector>, FaceDetError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixedDetector(vec![det(0.9, 1.0, 1.0, 5.0, 5.0)])))
        }
    }

    fn adapter(accelerator: bool) -> (DetectionAdapter, Arc<AtomicUsize>) {
        let builds = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            builds: builds.clone(),
            accelerator,
        };
        (
            DetectionAdapter::new(Box::new(provider), ModelOptions::default()),
            builds,
        )
    }

    fn small_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(20, 10))
    }

    #[test]
    fn threshold_boundary_keeps_equal_scores() {
        let raw = [det(0.59, 0.0, 0.0, 1.0, 1.0), det(0.6, 0.0, 0.0, 1.0, 1.0)];
        let records = rescale_detections(&raw, &conditioned(1.0, 1.0), 0.6);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].index, 2);
        assert_eq!(records[0].confidence, 0.6);
    }

    #[test]
    fn rescales_each_axis_independently() {
        let raw = [det(1.0, 10.0, 20.0, 30.0, 60.0)];
        let records = rescale_detections(&raw, &conditioned(2.0, 3.0), 0.0);
        let r = &records[0];
        assert_eq!((r.x, r.y, r.width, r.height), (20.0, 60.0, 40.0, 120.0));
        assert_eq!(r.class_id, FACE_CLASS_ID);
    }

    #[test]
    fn corners_truncate_to_whole_pixels() {
        let raw = [det(1.0, 10.7, 10.2, 20.9, 20.5)];
        let records = rescale_detections(&raw, &conditioned(1.0, 1.0), 0.0);
        let r = &records[0];
        assert_eq!((r.x, r.y, r.width, r.height), (10.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn first_run_builds_once() {
        let (adapter, builds) = adapter(false);
        assert_eq!(adapter.device(), None);

        adapter.run(small_image()).unwrap();
        adapter.run(small_image()).unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.device(), Some(Device::Cpu));
    }

    #[test]
    fn dirty_configuration_rebuilds_once_and_clears_flag() {
        let (adapter, builds) = adapter(false);
        adapter.run(small_image()).unwrap();

        let mut config = adapter.configuration();
        config.confidence_threshold = 0.95;
        adapter.set_configuration(config).unwrap();
        assert!(adapter.configuration().dirty);

        let records = adapter.run(small_image()).unwrap();
        assert!(records.is_empty());
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(!adapter.configuration().dirty);
    }

    #[test]
    fn accelerator_used_when_available() {
        let (adapter, _) = adapter(true);
        assert!(adapter.configuration().use_accelerator);
        adapter.run(small_image()).unwrap();
        assert_eq!(adapter.device(), Some(Device::Cuda(0)));
    }

    #[test]
    fn missing_accelerator_falls_back_to_cpu() {
        let (adapter, _) = adapter(false);
        let mut config = adapter.configuration();
        config.use_accelerator = true;
        adapter.set_configuration(config).unwrap();

        adapter.run(small_image()).unwrap();
        assert_eq!(adapter.device(), Some(Device::Cpu));
    }

    #[test]
    fn invalid_threshold_leaves_configuration_untouched() {
        let (adapter, _) = adapter(false);
        let before = adapter.configuration();
        let result = adapter.set_configuration(Configuration {
            confidence_threshold: 2.0,
            ..before.clone()
        });
        assert!(matches!(result, Err(FaceDetError::InvalidThreshold(_))));
        assert_eq!(adapter.configuration(), before);
    }
}
