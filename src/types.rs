use serde::{Deserialize, Serialize};

/// A point in the detector's normalized image convention: both axes in [0, 1],
/// origin at the bottom-left, vertical axis increasing upward.
pub type NormalizedPoint = glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> ImageSize {
        ImageSize { width, height }
    }

    /// Converts a normalized detector point to absolute pixel coordinates with a
    /// top-left origin.
    pub fn to_pixel(&self, point: &NormalizedPoint) -> (f64, f64) {
        (
            point.x as f64 * self.width,
            (1.0 - point.y as f64) * self.height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointWithDepth {
    pub point: NormalizedPoint,
    pub depth: f32,
}

impl PointWithDepth {
    pub fn new(point: NormalizedPoint, depth: f32) -> PointWithDepth {
        PointWithDepth { point, depth }
    }
}

pub fn midpoint(a: &NormalizedPoint, b: &NormalizedPoint) -> NormalizedPoint {
    (*a + *b) / 2.0
}

/// Device-relative horizontal offset in compass terms: north-positive, east-positive, meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompassDelta {
    pub north: f64,
    pub east: f64,
}

impl CompassDelta {
    pub fn new(north: f64, east: f64) -> CompassDelta {
        CompassDelta { north, east }
    }

    pub fn distance(&self) -> f64 {
        self.north.hypot(self.east)
    }

    /// Arithmetic mean; zero for an empty slice.
    pub fn mean(deltas: &[CompassDelta]) -> CompassDelta {
        if deltas.is_empty() {
            return CompassDelta::default();
        }
        let n = deltas.len() as f64;
        let (north, east) = deltas
            .iter()
            .fold((0.0, 0.0), |(sn, se), d| (sn + d.north, se + d.east));
        CompassDelta::new(north / n, east / n)
    }
}
