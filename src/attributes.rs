use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::camera::CaptureFrame;
use crate::depth::require_valid;
use crate::error::{LocalizationError, Result};
use crate::feature::DetectedFeature;
use crate::projection::{PlanarDelta, RayProjector};
use crate::types::PointWithDepth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    Width,
    RunningSlope,
    CrossSlope,
    LidarDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Meters,
    Degrees,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Meters => "m",
            Unit::Degrees => "°",
        }
    }
}

impl AttributeKind {
    pub const MEASURED: [AttributeKind; 3] = [
        AttributeKind::Width,
        AttributeKind::RunningSlope,
        AttributeKind::CrossSlope,
    ];

    pub fn id(&self) -> u32 {
        match self {
            AttributeKind::Width => 10,
            AttributeKind::RunningSlope => 20,
            AttributeKind::CrossSlope => 30,
            AttributeKind::LidarDepth => 50,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Width => "Width",
            AttributeKind::RunningSlope => "Running Slope",
            AttributeKind::CrossSlope => "Cross Slope",
            AttributeKind::LidarDepth => "LiDAR Depth",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            AttributeKind::Width | AttributeKind::LidarDepth => Unit::Meters,
            AttributeKind::RunningSlope | AttributeKind::CrossSlope => Unit::Degrees,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name(), self.unit().symbol())
    }

    /// Key under which the value is tagged on the mapped feature.
    pub fn tag_key(&self) -> &'static str {
        match self {
            AttributeKind::Width => "width",
            AttributeKind::RunningSlope => "incline",
            AttributeKind::CrossSlope => "cross_slope",
            AttributeKind::LidarDepth => "lidar_depth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeasurement {
    pub kind: AttributeKind,
    pub value: f64,
}

impl AttributeMeasurement {
    pub fn new(kind: AttributeKind, value: f64) -> AttributeMeasurement {
        AttributeMeasurement { kind, value }
    }

    pub fn tag_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

/// Four projected corners: bottom-left, top-left, top-right, bottom-right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trapezoid {
    pub bottom_left: PlanarDelta,
    pub top_left: PlanarDelta,
    pub top_right: PlanarDelta,
    pub bottom_right: PlanarDelta,
}

fn slope_degrees(low: &PlanarDelta, high: &PlanarDelta) -> Result<f64> {
    let rise = high.y - low.y;
    let run = low.horizontal_distance(high);
    if run == 0.0 {
        return Err(LocalizationError::DivisionByZero);
    }
    Ok((rise / run).atan().to_degrees())
}

impl Trapezoid {
    pub fn from_deltas(deltas: &[PlanarDelta]) -> Result<Trapezoid> {
        match deltas {
            [bottom_left, top_left, top_right, bottom_right] => Ok(Trapezoid {
                bottom_left: *bottom_left,
                top_left: *top_left,
                top_right: *top_right,
                bottom_right: *bottom_right,
            }),
            _ => Err(LocalizationError::InvalidBounds {
                expected: 4,
                actual: deltas.len(),
            }),
        }
    }

    pub fn from_samples(samples: &[PointWithDepth], projector: &RayProjector) -> Result<Trapezoid> {
        if samples.len() != 4 {
            return Err(LocalizationError::InvalidBounds {
                expected: 4,
                actual: samples.len(),
            });
        }
        let deltas: Vec<PlanarDelta> = projector
            .project_all(samples)
            .iter()
            .map(|d| d.to_planar())
            .collect();
        Trapezoid::from_deltas(&deltas)
    }

    /// Mean of the bottom and top edge lengths.
    pub fn width(&self) -> f64 {
        let bottom = self.bottom_left.distance(&self.bottom_right);
        let top = self.top_left.distance(&self.top_right);
        (bottom + top) / 2.0
    }

    pub fn running_slope(&self) -> Result<f64> {
        let bottom = self.bottom_left.midpoint(&self.bottom_right);
        let top = self.top_left.midpoint(&self.top_right);
        slope_degrees(&bottom, &top)
    }

    pub fn cross_slope(&self) -> Result<f64> {
        let left = self.bottom_left.midpoint(&self.top_left);
        let right = self.top_right.midpoint(&self.bottom_right);
        slope_degrees(&left, &right)
    }
}

pub fn width(samples: &[PointWithDepth], projector: &RayProjector) -> Result<AttributeMeasurement> {
    let trapezoid = Trapezoid::from_samples(samples, projector)?;
    Ok(AttributeMeasurement::new(AttributeKind::Width, trapezoid.width()))
}

pub fn running_slope(samples: &[PointWithDepth], projector: &RayProjector) -> Result<AttributeMeasurement> {
    let trapezoid = Trapezoid::from_samples(samples, projector)?;
    Ok(AttributeMeasurement::new(
        AttributeKind::RunningSlope,
        trapezoid.running_slope()?,
    ))
}

pub fn cross_slope(samples: &[PointWithDepth], projector: &RayProjector) -> Result<AttributeMeasurement> {
    let trapezoid = Trapezoid::from_samples(samples, projector)?;
    Ok(AttributeMeasurement::new(
        AttributeKind::CrossSlope,
        trapezoid.cross_slope()?,
    ))
}

/// Raw depth at each trapezoid corner of `feature`.
pub fn trapezoid_samples(feature: &DetectedFeature, frame: &CaptureFrame) -> Result<Vec<PointWithDepth>> {
    let sampler = frame.sampler()?;
    let corners = feature.shape.trapezoid_corners();
    if corners.len() != 4 {
        return Err(LocalizationError::InvalidBounds {
            expected: 4,
            actual: corners.len(),
        });
    }
    let depths = sampler.depths_at(corners)?;
    require_valid(&depths)?;
    Ok(corners
        .iter()
        .zip(depths)
        .map(|(p, d)| PointWithDepth::new(*p, d))
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeReport {
    pub width: Option<AttributeMeasurement>,
    pub running_slope: Option<AttributeMeasurement>,
    pub cross_slope: Option<AttributeMeasurement>,
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<(AttributeKind, LocalizationError)>,
}

/// Failures as `{tag_key: reason}`.
fn serialize_failures<S: serde::Serializer>(
    failures: &[(AttributeKind, LocalizationError)],
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_map(failures.iter().map(|(kind, e)| (kind.tag_key(), e.to_string())))
}

impl AttributeReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&AttributeMeasurement> {
        match kind {
            AttributeKind::Width => self.width.as_ref(),
            AttributeKind::RunningSlope => self.running_slope.as_ref(),
            AttributeKind::CrossSlope => self.cross_slope.as_ref(),
            AttributeKind::LidarDepth => None,
        }
    }

    pub fn measurements(&self) -> impl Iterator<Item = &AttributeMeasurement> {
        [&self.width, &self.running_slope, &self.cross_slope]
            .into_iter()
            .flatten()
    }
}

/// Width, running slope and cross slope, each attempted independently.
pub fn estimate_attributes(feature: &DetectedFeature, frame: &CaptureFrame) -> AttributeReport {
    estimate_selected(feature, frame, &AttributeKind::MEASURED)
}

/// Only the trapezoid measurements are produced here; `LidarDepth` comes from
/// localization and is ignored if requested.
pub fn estimate_selected(
    feature: &DetectedFeature,
    frame: &CaptureFrame,
    kinds: &[AttributeKind],
) -> AttributeReport {
    let projector = RayProjector::for_frame(frame);
    let samples = trapezoid_samples(feature, frame);

    let mut report = AttributeReport::default();
    for &kind in kinds {
        let slot = match kind {
            AttributeKind::Width => &mut report.width,
            AttributeKind::RunningSlope => &mut report.running_slope,
            AttributeKind::CrossSlope => &mut report.cross_slope,
            AttributeKind::LidarDepth => continue,
        };
        let measured = samples.as_ref().map_err(|e| e.clone()).and_then(|s| match kind {
            AttributeKind::Width => width(s, &projector),
            AttributeKind::RunningSlope => running_slope(s, &projector),
            _ => cross_slope(s, &projector),
        });
        match measured {
            Ok(m) => {
                debug!("feature {}: {} = {:.3}", feature.id, kind.name(), m.value);
                *slot = Some(m);
            }
            Err(e) => {
                warn!("feature {}: {} failed: {}", feature.id, kind.name(), e);
                report.failures.push((kind, e));
            }
        }
    }
    report
}
