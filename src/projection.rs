use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraOptics, CameraPose, CaptureFrame};
use crate::types::{CompassDelta, ImageSize, NormalizedPoint, PointWithDepth};

/// World-space offset of a projected point from the camera centre, in the raw
/// world convention (east = +X, up = +Y, north = -Z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldDelta(pub na::Vector3<f64>);

/// Local 3-D offset used by measurements: x east, y up, z north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarDelta {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PlanarDelta {
    pub fn as_vector(&self) -> na::Vector3<f64> {
        na::Vector3::new(self.x, self.y, self.z)
    }

    pub fn midpoint(&self, other: &PlanarDelta) -> PlanarDelta {
        PlanarDelta {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    pub fn distance(&self, other: &PlanarDelta) -> f64 {
        (self.as_vector() - other.as_vector()).norm()
    }

    /// Distance in the horizontal (x, z) plane.
    pub fn horizontal_distance(&self, other: &PlanarDelta) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

impl WorldDelta {
    /// Compass semantics for geolocation: `north = -z`, `east = x`.
    pub fn to_compass(&self) -> CompassDelta {
        CompassDelta::new(-self.0.z, self.0.x)
    }

    /// Measurement frame; only lengths and heights are read from it.
    pub fn to_planar(&self) -> PlanarDelta {
        PlanarDelta {
            x: self.0.x,
            y: self.0.y,
            z: -self.0.z,
        }
    }
}

/// Casts the ray through `point`, walks `depth` meters along it and returns the
/// resulting offset from the camera centre in world space.
pub fn project_to_world(
    point: &NormalizedPoint,
    depth: f32,
    image_size: &ImageSize,
    pose: &CameraPose,
    optics: &CameraOptics,
) -> WorldDelta {
    let (px, py) = image_size.to_pixel(point);
    let ray = optics.inverse() * na::Vector3::new(px, py, 1.0);
    let direction = ray.normalize();

    let mut camera_point = direction * depth as f64;
    // camera native axes are y down, z forward; world expects y up, z toward viewer
    camera_point.y = -camera_point.y;
    camera_point.z = -camera_point.z;

    let world_point = pose.transform_point(&camera_point);
    WorldDelta(world_point - pose.origin())
}

pub fn world_delta_to_local_delta(delta: &WorldDelta) -> CompassDelta {
    delta.to_compass()
}

/// Projection bound to one frame's pose, optics and image size.
#[derive(Debug, Clone, Copy)]
pub struct RayProjector<'a> {
    pub image_size: &'a ImageSize,
    pub pose: &'a CameraPose,
    pub optics: &'a CameraOptics,
}

impl<'a> RayProjector<'a> {
    pub fn for_frame(frame: &'a CaptureFrame) -> RayProjector<'a> {
        RayProjector {
            image_size: &frame.image_size,
            pose: &frame.pose,
            optics: &frame.optics,
        }
    }

    pub fn project(&self, sample: &PointWithDepth) -> WorldDelta {
        project_to_world(
            &sample.point,
            sample.depth,
            self.image_size,
            self.pose,
            self.optics,
        )
    }

    pub fn project_all(&self, samples: &[PointWithDepth]) -> Vec<WorldDelta> {
        samples.iter().map(|s| self.project(s)).collect()
    }
}
