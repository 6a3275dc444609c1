use serde::{Deserialize, Serialize};

use crate::types::NormalizedPoint;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: NormalizedPoint,
    pub max: NormalizedPoint,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Outline of one detected feature in normalized detector coordinates, with the
/// statistics the localization strategies need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureShape {
    pub points: Vec<NormalizedPoint>,
    pub centroid: NormalizedPoint,
    pub bounding_box: BoundingBox,
    pub area: f32,
    pub perimeter: f32,
    /// Corners ordered bottom-left, top-left, top-right, bottom-right.
    pub trapezoid: Option<Vec<NormalizedPoint>>,
}

impl FeatureShape {
    pub fn from_points(
        points: Vec<NormalizedPoint>,
        trapezoid: Option<Vec<NormalizedPoint>>,
    ) -> FeatureShape {
        let (centroid, area) = centroid_and_area(&points);
        FeatureShape {
            bounding_box: bounding_box(&points),
            perimeter: perimeter(&points),
            centroid,
            area,
            points,
            trapezoid,
        }
    }

    /// Corners for the 4-point measurements: the explicit trapezoid if the
    /// detector produced one, otherwise the outline itself.
    pub fn trapezoid_corners(&self) -> &[NormalizedPoint] {
        self.trapezoid.as_deref().unwrap_or(&self.points)
    }

    pub fn leftmost(&self) -> Option<NormalizedPoint> {
        self.points
            .iter()
            .copied()
            .min_by(|a, b| a.x.total_cmp(&b.x))
    }

    pub fn rightmost(&self) -> Option<NormalizedPoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.x.total_cmp(&b.x))
    }
}

/// Shoelace centroid and absolute area of the closed polygon.
pub fn centroid_and_area(points: &[NormalizedPoint]) -> (NormalizedPoint, f32) {
    if points.is_empty() {
        return (NormalizedPoint::ZERO, 0.0);
    }
    if points.len() < 3 {
        let sum: NormalizedPoint = points.iter().copied().sum();
        return (sum / points.len() as f32, 0.0);
    }

    let n = points.len();
    let mut area = 0.0f32;
    let mut cx = 0.0f32;
    let mut cy = 0.0f32;
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        let cross = p0.perp_dot(p1);
        area += cross;
        cx += (p0.x + p1.x) * cross;
        cy += (p0.y + p1.y) * cross;
    }
    area *= 0.5;
    if area == 0.0 {
        return (NormalizedPoint::ZERO, 0.0);
    }
    (
        NormalizedPoint::new(cx / (6.0 * area), cy / (6.0 * area)),
        area.abs(),
    )
}

pub fn bounding_box(points: &[NormalizedPoint]) -> BoundingBox {
    let Some(first) = points.first() else {
        return BoundingBox::default();
    };
    points.iter().fold(
        BoundingBox {
            min: *first,
            max: *first,
        },
        |b, p| BoundingBox {
            min: b.min.min(*p),
            max: b.max.max(*p),
        },
    )
}

pub fn perimeter(points: &[NormalizedPoint]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].distance(points[(i + 1) % n]))
        .sum()
}
