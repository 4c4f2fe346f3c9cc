use std::collections::BTreeMap;

use crate::error::FaceDetError;

/// String key/value form of the configuration exchanged with a host.
pub type ParamMap = BTreeMap<String, String>;

/// Parameter key for accelerator usage.
pub const PARAM_CUDA: &str = "cuda";
/// Parameter key for the confidence threshold.
pub const PARAM_CONF_THRES: &str = "conf_thres";

/// Default minimum confidence for a reported face.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Detection parameters as seen by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Request an accelerator; the adapter falls back to CPU when none exists.
    pub use_accelerator: bool,
    /// Detections scoring below this are dropped.
    pub confidence_threshold: f32,
    /// The bound model is stale and must be rebuilt before the next run.
    pub dirty: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            use_accelerator: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            dirty: false,
        }
    }
}

impl Configuration {
    /// Reject thresholds outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), FaceDetError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(FaceDetError::InvalidThreshold(self.confidence_threshold));
        }
        Ok(())
    }

    /// Build a configuration from a host parameter map. The result is marked dirty.
    pub fn from_param_map(map: &ParamMap) -> Result<Self, FaceDetError> {
        let cuda = required(map, PARAM_CUDA)?;
        let use_accelerator = parse_bool(cuda).ok_or_else(|| invalid(PARAM_CUDA, cuda))?;

        let thres = required(map, PARAM_CONF_THRES)?;
        let confidence_threshold: f32 = thres
            .trim()
            .parse()
            .map_err(|_| invalid(PARAM_CONF_THRES, thres))?;

        let config = Self {
            use_accelerator,
            confidence_threshold,
            dirty: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// Host parameter map for this configuration. `dirty` is not exported.
    pub fn to_param_map(&self) -> ParamMap {
        let mut map = ParamMap::new();
        let cuda = if self.use_accelerator { "True" } else { "False" };
        map.insert(PARAM_CUDA.to_string(), cuda.to_string());
        map.insert(
            PARAM_CONF_THRES.to_string(),
            self.confidence_threshold.to_string(),
        );
        map
    }
}

fn required<'a>(map: &'a ParamMap, key: &str) -> Result<&'a str, FaceDetError> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| FaceDetError::MissingParameter(key.to_string()))
}

fn invalid(key: &str, value: &str) -> FaceDetError {
    FaceDetError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Parse the boolean spellings hosts commonly write (`True`, `yes`, `1`, `off`, ...).
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}
