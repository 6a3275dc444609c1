use rayon::prelude::*;
use serde::Serialize;

use crate::attributes::{AttributeKind, AttributeMeasurement, AttributeReport, estimate_attributes};
use crate::camera::CaptureFrame;
use crate::config::EstimatorConfig;
use crate::error::Result;
use crate::feature::DetectedFeature;
use crate::localization::{LocalizationDispatcher, LocalizationOutcome};

/// Everything computed for one feature of one capture.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub id: u32,
    #[serde(serialize_with = "serialize_location")]
    pub location: Result<LocalizationOutcome>,
    pub attributes: AttributeReport,
    pub lidar_depth: Option<AttributeMeasurement>,
}

fn serialize_location<S: serde::Serializer>(
    location: &Result<LocalizationOutcome>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match location {
        Ok(outcome) => outcome.serialize(s),
        Err(e) => s.collect_str(&format_args!("error: {}", e)),
    }
}

/// Localize every feature against the same frame. Results keep input order.
pub fn localize_all(
    features: &[DetectedFeature],
    frame: &CaptureFrame,
    config: &EstimatorConfig,
) -> Vec<Result<LocalizationOutcome>> {
    let dispatcher = LocalizationDispatcher::new(config.clone());
    features
        .par_iter()
        .map(|f| dispatcher.localize(f, frame))
        .collect()
}

pub fn estimate_all(features: &[DetectedFeature], frame: &CaptureFrame) -> Vec<AttributeReport> {
    features
        .par_iter()
        .map(|f| estimate_attributes(f, frame))
        .collect()
}

pub fn process_features(
    features: &[DetectedFeature],
    frame: &CaptureFrame,
    config: &EstimatorConfig,
) -> Vec<FeatureReport> {
    let dispatcher = LocalizationDispatcher::new(config.clone());
    features
        .par_iter()
        .map(|f| {
            let location = dispatcher.localize(f, frame);
            let lidar_depth = location.as_ref().ok().map(|o| {
                AttributeMeasurement::new(AttributeKind::LidarDepth, o.result().depth as f64)
            });
            FeatureReport {
                id: f.id,
                location,
                attributes: estimate_attributes(f, frame),
                lidar_depth,
            }
        })
        .collect()
}
