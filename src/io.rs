use std::path::Path;

use image::RgbImage;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::batch::FeatureReport;
use crate::camera::{CaptureFrame, CaptureRecord};
use crate::feature::DetectedFeature;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Capture {
        path: String,
        #[source]
        source: crate::error::LocalizationError,
    },
    #[error("{0}")]
    Image(#[from] image::ImageError),
}

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &str, object: &T) -> Result<(), IoError> {
    let j = serde_json::to_string_pretty(object).map_err(|source| IoError::Json {
        path: output_path.to_string(),
        source,
    })?;
    std::fs::write(output_path, j).map_err(|source| IoError::File {
        path: output_path.to_string(),
        source,
    })
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &str) -> Result<T, IoError> {
    let contents = std::fs::read_to_string(file_path).map_err(|source| IoError::File {
        path: file_path.to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| IoError::Json {
        path: file_path.to_string(),
        source,
    })
}

/// One capture and the features segmented from it, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureFile {
    pub capture: CaptureRecord,
    #[serde(default)]
    pub features: Vec<DetectedFeature>,
}

impl CaptureFile {
    pub fn new(frame: &CaptureFrame, features: Vec<DetectedFeature>) -> CaptureFile {
        CaptureFile {
            capture: frame.to_record(),
            features,
        }
    }
}

/// Writes a preview image; the format follows the file extension.
pub fn write_image(path: &Path, img: &RgbImage) -> Result<(), IoError> {
    img.save(path)?;
    Ok(())
}

/// Reads a capture file and rebuilds its frame.
pub fn load_capture(path: &Path) -> Result<(CaptureFrame, Vec<DetectedFeature>), IoError> {
    let path_str = path.to_string_lossy().to_string();
    let file: CaptureFile = object_from_json(&path_str)?;
    log::trace!(
        "{}: {} features, t={}",
        path_str,
        file.features.len(),
        file.capture.time_ns
    );
    let frame = CaptureFrame::configure(file.capture).map_err(|source| IoError::Capture {
        path: path_str,
        source,
    })?;
    Ok((frame, file.features))
}

#[derive(Debug, Serialize)]
pub struct FrameReport {
    pub source: String,
    pub time_ns: i64,
    pub features: Vec<FeatureReport>,
}

#[derive(Debug, Serialize)]
struct LocalizationReport<'a> {
    timestamp: String,
    frame_count: usize,
    feature_count: usize,
    degraded_count: usize,
    failed_count: usize,
    frames: &'a [FrameReport],
}

fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Writes all frame results as one JSON report.
pub fn write_report(output_path: &str, frames: &[FrameReport]) -> Result<(), IoError> {
    let features = || frames.iter().flat_map(|f| &f.features);
    let report = LocalizationReport {
        timestamp: now_rfc3339(),
        frame_count: frames.len(),
        feature_count: features().count(),
        degraded_count: features()
            .filter(|f| f.location.as_ref().is_ok_and(|o| o.is_degraded()))
            .count(),
        failed_count: features().filter(|f| f.location.is_err()).count(),
        frames,
    };
    object_to_json(output_path, &report)
}
