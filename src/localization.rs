use log::{debug, warn};
use serde::Serialize;

use crate::camera::CaptureFrame;
use crate::config::EstimatorConfig;
use crate::depth::require_valid;
use crate::error::{LocalizationError, Result};
use crate::feature::{DetectedFeature, GeometryClass};
use crate::geodesy::{self, GeoCoordinate};
use crate::projection::RayProjector;
use crate::types::{CompassDelta, NormalizedPoint, PointWithDepth, midpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strategy {
    /// Radius-averaged depth at the centroid, one coordinate.
    Centroid,
    /// Top and bottom edge midpoints of a 4-point trapezoid.
    TrapezoidMidpoints,
    /// Leftmost point, their midpoint, rightmost point.
    PolygonExtremes,
}

impl Strategy {
    pub fn for_geometry(geometry: GeometryClass) -> Strategy {
        match geometry {
            GeometryClass::Point => Strategy::Centroid,
            GeometryClass::LineString => Strategy::TrapezoidMidpoints,
            GeometryClass::Polygon => Strategy::PolygonExtremes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationResult {
    pub coordinates: Vec<Vec<GeoCoordinate>>,
    /// Representative depth in meters.
    pub depth: f32,
    /// Mean device-relative offset of the localized points.
    pub delta: CompassDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LocalizationOutcome {
    Resolved {
        strategy: Strategy,
        result: LocationResult,
    },
    FellBack {
        attempted: Strategy,
        #[serde(serialize_with = "serialize_reason")]
        reason: LocalizationError,
        result: LocationResult,
    },
}

fn serialize_reason<S: serde::Serializer>(reason: &LocalizationError, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

impl LocalizationOutcome {
    pub fn result(&self) -> &LocationResult {
        match self {
            LocalizationOutcome::Resolved { result, .. } => result,
            LocalizationOutcome::FellBack { result, .. } => result,
        }
    }

    pub fn into_result(self) -> LocationResult {
        match self {
            LocalizationOutcome::Resolved { result, .. } => result,
            LocalizationOutcome::FellBack { result, .. } => result,
        }
    }

    /// Strategy that actually produced the result.
    pub fn strategy(&self) -> Strategy {
        match self {
            LocalizationOutcome::Resolved { strategy, .. } => *strategy,
            LocalizationOutcome::FellBack { .. } => Strategy::Centroid,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, LocalizationOutcome::FellBack { .. })
    }
}

pub fn locate_centroid(
    feature: &DetectedFeature,
    frame: &CaptureFrame,
    config: &EstimatorConfig,
) -> Result<LocationResult> {
    let sampler = frame.sampler()?;
    let centroid = feature.centroid();
    let depth = sampler.averaged_depth_in_radius(&centroid, config.centroid_radius_px)?;

    let projector = RayProjector::for_frame(frame);
    let delta = projector
        .project(&PointWithDepth::new(centroid, depth))
        .to_compass();
    let coordinate = geodesy::offset(&frame.device_location, &delta);
    Ok(LocationResult {
        coordinates: vec![vec![coordinate]],
        depth,
        delta,
    })
}

fn locate_points(points: &[NormalizedPoint], frame: &CaptureFrame) -> Result<LocationResult> {
    let sampler = frame.sampler()?;
    let depths = sampler.depths_at(points)?;
    require_valid(&depths)?;

    let projector = RayProjector::for_frame(frame);
    let deltas: Vec<CompassDelta> = points
        .iter()
        .zip(&depths)
        .map(|(p, d)| projector.project(&PointWithDepth::new(*p, *d)).to_compass())
        .collect();
    let ring = deltas
        .iter()
        .map(|d| geodesy::offset(&frame.device_location, d))
        .collect();

    Ok(LocationResult {
        coordinates: vec![ring],
        depth: depths.iter().sum::<f32>() / depths.len() as f32,
        delta: CompassDelta::mean(&deltas),
    })
}

/// Two-point path through the top and bottom edge midpoints of the outline,
/// which must be a 4-point trapezoid ordered BL, TL, TR, BR.
pub fn locate_trapezoid(feature: &DetectedFeature, frame: &CaptureFrame) -> Result<LocationResult> {
    let corners = feature.points();
    let [bottom_left, top_left, top_right, bottom_right] = corners else {
        return Err(LocalizationError::InvalidBounds {
            expected: 4,
            actual: corners.len(),
        });
    };
    let bottom = midpoint(bottom_left, bottom_right);
    let top = midpoint(top_left, top_right);
    // image vertical runs opposite to the path direction
    locate_points(&[top, bottom], frame)
}

pub fn locate_polygon(feature: &DetectedFeature, frame: &CaptureFrame) -> Result<LocationResult> {
    let (Some(left), Some(right)) = (feature.shape.leftmost(), feature.shape.rightmost()) else {
        return Err(LocalizationError::InvalidBounds {
            expected: 1,
            actual: 0,
        });
    };
    locate_points(&[left, midpoint(&left, &right), right], frame)
}

/// Picks a localization strategy per feature geometry and degrades to the
/// centroid strategy when a richer one fails.
#[derive(Debug, Clone, Default)]
pub struct LocalizationDispatcher {
    pub config: EstimatorConfig,
}

impl LocalizationDispatcher {
    pub fn new(config: EstimatorConfig) -> LocalizationDispatcher {
        LocalizationDispatcher { config }
    }

    pub fn localize(&self, feature: &DetectedFeature, frame: &CaptureFrame) -> Result<LocalizationOutcome> {
        let strategy = Strategy::for_geometry(feature.geometry);
        debug!("feature {}: {:?} -> {:?}", feature.id, feature.geometry, strategy);

        let attempt = match strategy {
            Strategy::Centroid => locate_centroid(feature, frame, &self.config),
            Strategy::TrapezoidMidpoints => locate_trapezoid(feature, frame),
            Strategy::PolygonExtremes => locate_polygon(feature, frame),
        };
        match attempt {
            Ok(result) => Ok(LocalizationOutcome::Resolved { strategy, result }),
            Err(reason) if strategy != Strategy::Centroid && self.config.fallback_to_centroid => {
                warn!(
                    "feature {}: {:?} failed ({}), falling back to centroid",
                    feature.id, strategy, reason
                );
                let result = locate_centroid(feature, frame, &self.config)?;
                Ok(LocalizationOutcome::FellBack {
                    attempted: strategy,
                    reason,
                    result,
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// [`LocalizationDispatcher::localize`] with the default configuration.
pub fn localize(feature: &DetectedFeature, frame: &CaptureFrame) -> Result<LocalizationOutcome> {
    LocalizationDispatcher::default().localize(feature, frame)
}
