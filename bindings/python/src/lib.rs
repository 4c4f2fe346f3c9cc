use std::collections::BTreeMap;
use std::path::PathBuf;

use facedetect_core::{
    Configurable, DetectionCollector, FaceDetError, FaceDetectionTask, ModelOptions, Runnable,
    RustfaceProvider, CLASS_NAMES,
};
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

fn to_py_err(e: FaceDetError) -> PyErr {
    match e {
        FaceDetError::ModelLoad { .. } => PyIOError::new_err(e.to_string()),
        FaceDetError::Inference(_) => PyRuntimeError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

/// Face detection task backed by the SeetaFace model.
///
/// Args:
///     weights_dir: Directory holding seeta_fd_frontal_v1.0.bin (optional; defaults to
///                  $FACEDETECT_WEIGHTS_DIR or ./model)
#[pyclass]
struct FaceDetection {
    task: FaceDetectionTask,
}

#[pymethods]
impl FaceDetection {
    #[new]
    #[pyo3(signature = (weights_dir=None))]
    fn new(weights_dir: Option<PathBuf>) -> Self {
        let options = ModelOptions { weights_dir };
        Self {
            task: FaceDetectionTask::new(Box::new(RustfaceProvider), options),
        }
    }

    /// Detect faces in an encoded image (JPEG, PNG, or WebP).
    ///
    /// Returns:
    ///     list of dicts with keys: index (int), class_id (int), confidence (float),
    ///                              x, y, width, height (float, source-image pixels)
    fn run(&self, py: Python<'_>, input: Vec<u8>) -> PyResult<Py<PyList>> {
        let image = image::load_from_memory(&input)
            .map_err(|e| to_py_err(FaceDetError::DecodeError(e.to_string())))?;

        let mut sink = DetectionCollector::default();
        py.allow_threads(|| self.task.run(image, &mut sink))
            .map_err(to_py_err)?;

        let list = PyList::empty(py);
        for record in &sink.detections {
            let dict = PyDict::new(py);
            dict.set_item("index", record.index)?;
            dict.set_item("class_id", record.class_id)?;
            dict.set_item("confidence", record.confidence)?;
            dict.set_item("x", record.x)?;
            dict.set_item("y", record.y)?;
            dict.set_item("width", record.width)?;
            dict.set_item("height", record.height)?;
            list.append(dict)?;
        }
        Ok(list.unbind())
    }

    /// Current parameters as a dict of strings: {"cuda": ..., "conf_thres": ...}.
    fn param_map(&self) -> BTreeMap<String, String> {
        self.task.param_map()
    }

    /// Update parameters from a dict of strings. The model is rebuilt on the next run.
    fn set_param_map(&self, params: BTreeMap<String, String>) -> PyResult<()> {
        self.task.set_param_map(&params).map_err(to_py_err)
    }

    /// Names of the classes reported by `run`.
    fn class_names(&self) -> Vec<&'static str> {
        CLASS_NAMES.to_vec()
    }

    /// Task metadata shown by the host.
    fn info(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let info = self.task.info();
        let dict = PyDict::new(py);
        dict.set_item("name", info.name)?;
        dict.set_item("short_description", info.short_description)?;
        dict.set_item("description", info.description)?;
        dict.set_item("path", info.path)?;
        dict.set_item("version", info.version)?;
        dict.set_item("authors", info.authors)?;
        dict.set_item("article", info.article)?;
        dict.set_item("journal", info.journal)?;
        dict.set_item("year", info.year)?;
        dict.set_item("license", info.license)?;
        dict.set_item("documentation_link", info.documentation_link)?;
        dict.set_item("repository", info.repository)?;
        dict.set_item("keywords", info.keywords)?;
        Ok(dict.into())
    }
}

#[pymodule]
fn pyfacedetect(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FaceDetection>()?;
    Ok(())
}
