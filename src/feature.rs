use serde::{Deserialize, Serialize};

use crate::contour::FeatureShape;
use crate::types::NormalizedPoint;

/// Target real-world shape a detected feature is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeometryClass {
    Point,
    LineString,
    #[default]
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFeature {
    pub id: u32,
    pub geometry: GeometryClass,
    pub shape: FeatureShape,
}

impl DetectedFeature {
    pub fn new(id: u32, geometry: GeometryClass, shape: FeatureShape) -> DetectedFeature {
        DetectedFeature {
            id,
            geometry,
            shape,
        }
    }

    pub fn from_points(id: u32, geometry: GeometryClass, points: Vec<NormalizedPoint>) -> DetectedFeature {
        DetectedFeature::new(id, geometry, FeatureShape::from_points(points, None))
    }

    pub fn centroid(&self) -> NormalizedPoint {
        self.shape.centroid
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.shape.points
    }
}
