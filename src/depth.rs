use image::{ImageBuffer, Luma};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{LocalizationError, Result};
use crate::types::NormalizedPoint;

pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Per-frame depth in meters, row-major with a top-left origin.
#[derive(Debug, Clone)]
pub struct DepthRaster {
    image: DepthImage,
}

impl DepthRaster {
    pub fn from_image(image: DepthImage) -> DepthRaster {
        DepthRaster { image }
    }

    /// Returns `None` when `values.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, values: Vec<f32>) -> Option<DepthRaster> {
        ImageBuffer::from_raw(width, height, values).map(DepthRaster::from_image)
    }

    pub fn from_fn<F>(width: u32, height: u32, f: F) -> DepthRaster
    where
        F: Fn(u32, u32) -> f32,
    {
        DepthRaster {
            image: ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    pub fn values(&self) -> &[f32] {
        self.image.as_raw()
    }
}

/// Plain serialized form of a raster, used by the JSON capture files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthRasterRecord {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f32>,
}

impl From<&DepthRaster> for DepthRasterRecord {
    fn from(raster: &DepthRaster) -> Self {
        DepthRasterRecord {
            width: raster.width(),
            height: raster.height(),
            values: raster.values().to_vec(),
        }
    }
}

impl TryFrom<DepthRasterRecord> for DepthRaster {
    type Error = LocalizationError;

    fn try_from(record: DepthRasterRecord) -> Result<Self> {
        let expected = record.width as usize * record.height as usize;
        let actual = record.values.len();
        DepthRaster::from_vec(record.width, record.height, record.values)
            .ok_or(LocalizationError::InvalidBounds { expected, actual })
    }
}

fn is_valid_depth(depth: f32) -> bool {
    depth.is_finite() && depth > 0.0
}

/// Read-only depth queries over one captured frame.
#[derive(Debug, Clone)]
pub struct DepthSampler {
    raster: DepthRaster,
}

impl DepthSampler {
    pub fn new(raster: DepthRaster) -> DepthSampler {
        DepthSampler { raster }
    }

    /// Builds a sampler that is pixel-aligned with the label raster used by detection.
    pub fn aligned_with(raster: DepthRaster, label_size: (u32, u32)) -> Result<DepthSampler> {
        if raster.dimensions() != label_size {
            return Err(LocalizationError::DimensionMismatch {
                depth: raster.dimensions(),
                label: label_size,
            });
        }
        Ok(DepthSampler::new(raster))
    }

    pub fn raster(&self) -> &DepthRaster {
        &self.raster
    }

    fn out_of_bounds(&self, x: i64, y: i64) -> LocalizationError {
        LocalizationError::OutOfBounds {
            x,
            y,
            width: self.raster.width(),
            height: self.raster.height(),
        }
    }

    pub fn depth_at(&self, x: i64, y: i64) -> Result<f32> {
        if x < 0 || y < 0 || x > u32::MAX as i64 || y > u32::MAX as i64 {
            return Err(self.out_of_bounds(x, y));
        }
        self.raster
            .get(x as u32, y as u32)
            .ok_or_else(|| self.out_of_bounds(x, y))
    }

    /// Maps a normalized detector point to a raster pixel, flipping the vertical axis.
    /// The upper boundary value 1.0 belongs to the last column/row.
    pub fn pixel_of(&self, point: &NormalizedPoint) -> Result<(i64, i64)> {
        if !point.is_finite() {
            return Err(self.out_of_bounds(-1, -1));
        }
        let w = self.raster.width() as f64;
        let h = self.raster.height() as f64;
        let mut x = (point.x as f64 * w).floor() as i64;
        let mut y = ((1.0 - point.y as f64) * h).floor() as i64;
        if point.x == 1.0 {
            x -= 1;
        }
        if point.y == 0.0 {
            y -= 1;
        }
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return Err(self.out_of_bounds(x, y));
        }
        Ok((x, y))
    }

    pub fn depth_at_point(&self, point: &NormalizedPoint) -> Result<f32> {
        let (x, y) = self.pixel_of(point)?;
        self.depth_at(x, y)
    }

    /// One raw lookup per point. No averaging and no validity filtering.
    pub fn depths_at(&self, points: &[NormalizedPoint]) -> Result<Vec<f32>> {
        points.iter().map(|p| self.depth_at_point(p)).collect()
    }

    /// Mean of every finite, positive depth whose pixel lies within `radius` px of
    /// `center`. Offsets falling outside the raster are skipped.
    ///
    /// Plain mean; outliers at object edges are not rejected.
    pub fn averaged_depth_in_radius(&self, center: &NormalizedPoint, radius: u32) -> Result<f32> {
        let (cx, cy) = self.pixel_of(center)?;
        // no offset beyond the larger raster side can land inside it
        let r = radius.min(self.raster.width().max(self.raster.height())) as i64;
        let r2 = r * r;

        let mut sum = 0.0f64;
        let mut count = 0usize;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                if let Ok(depth) = self.depth_at(cx + dx, cy + dy) {
                    if is_valid_depth(depth) {
                        sum += depth as f64;
                        count += 1;
                    }
                }
            }
        }
        if count == 0 {
            return Err(LocalizationError::NoValidDepth { radius });
        }
        trace!("averaged {} depth samples around ({}, {})", count, cx, cy);
        Ok((sum / count as f64) as f32)
    }
}

/// Rejects non-finite or non-positive raw samples, reporting the first offender.
pub fn require_valid(depths: &[f32]) -> Result<()> {
    match depths.iter().position(|d| !is_valid_depth(*d)) {
        Some(index) => Err(LocalizationError::InvalidDepth {
            index,
            value: depths[index],
        }),
        None => Ok(()),
    }
}
