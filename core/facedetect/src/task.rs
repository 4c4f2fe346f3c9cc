use image::DynamicImage;

use crate::adapter::{DetectionAdapter, DetectionRecord, CLASS_NAMES};
use crate::config::{Configuration, ParamMap};
use crate::error::FaceDetError;
use crate::face_detector::{DetectorProvider, ModelOptions};

/// Receives the results of a task run.
pub trait ResultSink {
    /// Called once per run, before any detection.
    fn set_class_names(&mut self, names: &[&str]);
    /// Called once per reported face, in detector order.
    fn add_detection(&mut self, record: DetectionRecord);
}

/// Something a workflow host can execute on an image.
pub trait Runnable {
    /// Process one image and report its faces to `sink`.
    fn run(&self, image: DynamicImage, sink: &mut dyn ResultSink) -> Result<(), FaceDetError>;

    /// Number of progress steps reported per run.
    fn progress_steps(&self) -> usize {
        1
    }
}

/// Read/write access to task parameters.
pub trait Configurable {
    /// Current parameters.
    fn configuration(&self) -> Configuration;
    /// Store new parameters and mark the model stale.
    fn set_configuration(&self, config: Configuration) -> Result<(), FaceDetError>;

    /// Parameters in host string form.
    fn param_map(&self) -> ParamMap {
        self.configuration().to_param_map()
    }

    /// Parse and store parameters given in host string form.
    fn set_param_map(&self, map: &ParamMap) -> Result<(), FaceDetError> {
        self.set_configuration(Configuration::from_param_map(map)?)
    }
}

/// [`ResultSink`] that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct DetectionCollector {
    /// Names set by the last run.
    pub class_names: Vec<String>,
    /// Every record received, in order.
    pub detections: Vec<DetectionRecord>,
}

impl ResultSink for DetectionCollector {
    fn set_class_names(&mut self, names: &[&str]) {
        self.class_names = names.iter().map(|n| n.to_string()).collect();
    }

    fn add_detection(&mut self, record: DetectionRecord) {
        self.detections.push(record);
    }
}

/// Descriptive metadata a host shows for the task.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct TaskInfo {
    pub name: &'static str,
    pub short_description: &'static str,
    pub description: &'static str,
    /// Location in the host's task tree.
    pub path: &'static str,
    pub version: &'static str,
    pub authors: &'static str,
    pub article: &'static str,
    pub journal: &'static str,
    pub year: u16,
    pub license: &'static str,
    pub documentation_link: &'static str,
    pub repository: &'static str,
    pub keywords: &'static str,
}

impl Default for TaskInfo {
    fn default() -> Self {
        Self {
            name: "infer_face_detection",
            short_description: "Multi-face detection with a pretrained detector",
            description: "Detects faces in an image with a pretrained model. Oversized \
                          images are downscaled before inference and boxes are reported \
                          in source-image pixels.",
            path: "Plugins/Rust/Detection",
            version: env!("CARGO_PKG_VERSION"),
            authors: "S. Wu, M. Kan, Z. He, S. Shan, X. Chen",
            article: "Funnel-structured cascade for multi-view face detection \
                      with alignment-awareness",
            journal: "Neurocomputing",
            year: 2017,
            license: "Apache-2.0",
            documentation_link: "https://docs.rs/facedetect",
            repository: "https://github.com/atomashpolskiy/rustface",
            keywords: "face detection, seetaface, rustface, detection",
        }
    }
}

/// A face detection task ready to be driven by a workflow host.
///
/// ```no_run
/// use facedetect::{DetectionCollector, FaceDetectionTask, Runnable, RustfaceProvider};
///
/// let task = FaceDetectionTask::new(Box::new(RustfaceProvider), Default::default());
/// let image = image::open("group.jpg").unwrap();
/// let mut sink = DetectionCollector::default();
/// task.run(image, &mut sink).unwrap();
/// println!("{} faces", sink.detections.len());
/// ```
pub struct FaceDetectionTask {
    info: TaskInfo,
    adapter: DetectionAdapter,
}

impl FaceDetectionTask {
    /// Task driving `provider`'s detectors with default parameters.
    pub fn new(provider: Box<dyn DetectorProvider>, options: ModelOptions) -> Self {
        Self {
            info: TaskInfo::default(),
            adapter: DetectionAdapter::new(provider, options),
        }
    }

    /// Host metadata.
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// The underlying adapter.
    pub fn adapter(&self) -> &DetectionAdapter {
        &self.adapter
    }
}

impl Runnable for FaceDetectionTask {
    fn run(&self, image: DynamicImage, sink: &mut dyn ResultSink) -> Result<(), FaceDetError> {
        let records = self.adapter.run(image)?;
        sink.set_class_names(&CLASS_NAMES);
        for record in records {
            sink.add_detection(record);
        }
        Ok(())
    }
}

impl Configurable for FaceDetectionTask {
    fn configuration(&self) -> Configuration {
        self.adapter.configuration()
    }

    fn set_configuration(&self, config: Configuration) -> Result<(), FaceDetError> {
        self.adapter.set_configuration(config)
    }
}
