//! Synthetic captures of a flat ground plane, for tests, benches and the `generate` command.

use nalgebra as na;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::camera::{CameraOptics, CameraPose, CaptureFrame};
use crate::contour::FeatureShape;
use crate::depth::{DepthRaster, DepthSampler};
use crate::error::Result;
use crate::feature::{DetectedFeature, GeometryClass};
use crate::geodesy::GeoCoordinate;
use crate::types::{ImageSize, NormalizedPoint, PointWithDepth};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundScene {
    pub camera_height: f64,
    /// Downward tilt from the horizon, degrees.
    pub pitch_deg: f64,
    /// Clockwise from north, degrees.
    pub heading_deg: f64,
    pub image_w_h: (u32, u32),
    pub depth_w_h: (u32, u32),
    pub focal: f64,
    pub device_location: GeoCoordinate,
    /// Uniform depth jitter in meters.
    pub noise: f32,
    /// Fraction of depth samples replaced by 0.
    pub dropout: f64,
    pub seed: u64,
}

impl Default for GroundScene {
    fn default() -> Self {
        Self {
            camera_height: 1.5,
            pitch_deg: 35.0,
            heading_deg: 0.0,
            image_w_h: (1920, 1440),
            depth_w_h: (256, 192),
            focal: 1000.0,
            device_location: GeoCoordinate::new(47.6062, -122.3321),
            noise: 0.0,
            dropout: 0.0,
            seed: 0,
        }
    }
}

impl GroundScene {
    pub fn image_size(&self) -> ImageSize {
        ImageSize::new(self.image_w_h.0 as f64, self.image_w_h.1 as f64)
    }

    pub fn pose(&self) -> CameraPose {
        let yaw = na::Rotation3::from_axis_angle(&na::Vector3::y_axis(), -self.heading_deg.to_radians());
        let pitch = na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), -self.pitch_deg.to_radians());
        CameraPose::new(
            (yaw * pitch).into_inner(),
            na::Vector3::new(0.0, self.camera_height, 0.0),
        )
    }

    pub fn optics(&self) -> Result<CameraOptics> {
        CameraOptics::pinhole(
            self.focal,
            self.focal,
            self.image_w_h.0 as f64 / 2.0,
            self.image_w_h.1 as f64 / 2.0,
        )
    }

    /// Range along the viewing ray to the ground, or 0 above the horizon.
    fn ground_range(&self, point: &NormalizedPoint, pose: &CameraPose, optics: &CameraOptics) -> f32 {
        let (px, py) = self.image_size().to_pixel(point);
        let ray = (optics.inverse() * na::Vector3::new(px, py, 1.0)).normalize();
        let direction = pose.rotation * na::Vector3::new(ray.x, -ray.y, -ray.z);
        if direction.y >= -1e-9 {
            return 0.0;
        }
        (self.camera_height / -direction.y) as f32
    }

    pub fn depth_raster(&self) -> Result<DepthRaster> {
        let pose = self.pose();
        let optics = self.optics()?;
        let (w, h) = self.depth_w_h;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut values = Vec::with_capacity(w as usize * h as usize);
        for y in 0..h {
            for x in 0..w {
                let point = NormalizedPoint::new(
                    (x as f32 + 0.5) / w as f32,
                    1.0 - (y as f32 + 0.5) / h as f32,
                );
                let mut depth = self.ground_range(&point, &pose, &optics);
                if self.noise > 0.0 && depth > 0.0 {
                    depth += rng.random_range(-self.noise..=self.noise);
                }
                if self.dropout > 0.0 && rng.random::<f64>() < self.dropout {
                    depth = 0.0;
                }
                values.push(depth);
            }
        }
        Ok(DepthRaster::from_vec(w, h, values).unwrap_or_else(|| DepthRaster::from_fn(w, h, |_, _| 0.0)))
    }

    pub fn frame(&self) -> Result<CaptureFrame> {
        let sampler = DepthSampler::new(self.depth_raster()?);
        Ok(CaptureFrame::new(
            Some(sampler),
            self.pose(),
            self.optics()?,
            self.image_size(),
            self.device_location,
        ))
    }

    /// World position of a ground point `east`/`north` meters from the device.
    pub fn ground_point(east: f64, north: f64) -> na::Vector3<f64> {
        na::Vector3::new(east, 0.0, -north)
    }

    /// Inverse of the ray cast: where `world` lands in the image and how far away it is.
    pub fn world_to_image(&self, world: &na::Vector3<f64>) -> Option<PointWithDepth> {
        let pose = self.pose();
        let optics = self.optics().ok()?;
        let camera = pose.rotation.transpose() * (world - pose.origin());
        let native = na::Vector3::new(camera.x, -camera.y, -camera.z);
        if native.z <= 0.0 {
            return None;
        }
        let pixel = optics.intrinsics() * native;
        let size = self.image_size();
        let point = NormalizedPoint::new(
            (pixel.x / pixel.z / size.width) as f32,
            (1.0 - pixel.y / pixel.z / size.height) as f32,
        );
        let inside = (0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y);
        inside.then(|| PointWithDepth::new(point, native.norm() as f32))
    }

    /// Detected feature whose outline is the image of the given ground points.
    pub fn ground_feature(
        &self,
        id: u32,
        geometry: GeometryClass,
        east_north: &[(f64, f64)],
    ) -> Option<DetectedFeature> {
        let points = east_north
            .iter()
            .map(|(e, n)| self.world_to_image(&Self::ground_point(*e, *n)).map(|s| s.point))
            .collect::<Option<Vec<_>>>()?;
        Some(DetectedFeature::new(
            id,
            geometry,
            FeatureShape::from_points(points, None),
        ))
    }
}
