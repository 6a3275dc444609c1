use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::depth::{DepthRaster, DepthRasterRecord, DepthSampler};
use crate::error::{LocalizationError, Result};
use crate::geodesy::GeoCoordinate;
use crate::types::ImageSize;

/// Camera-to-world rigid transform for one frame.
///
/// The world frame is gravity and heading aligned: east = +X, up = +Y, north = -Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub rotation: na::Matrix3<f64>,
    pub translation: na::Vector3<f64>,
}

impl CameraPose {
    pub fn new(rotation: na::Matrix3<f64>, translation: na::Vector3<f64>) -> CameraPose {
        CameraPose {
            rotation,
            translation,
        }
    }

    pub fn identity() -> CameraPose {
        CameraPose::new(na::Matrix3::identity(), na::Vector3::zeros())
    }

    /// Splits a homogeneous 4x4 transform into rotation and translation.
    pub fn from_homogeneous(m: &na::Matrix4<f64>) -> CameraPose {
        CameraPose::new(
            m.fixed_view::<3, 3>(0, 0).into_owned(),
            m.fixed_view::<3, 1>(0, 3).into_owned(),
        )
    }

    pub fn from_isometry(iso: &na::Isometry3<f64>) -> CameraPose {
        CameraPose::new(
            iso.rotation.to_rotation_matrix().into_inner(),
            iso.translation.vector,
        )
    }

    pub fn transform_point(&self, p: &na::Vector3<f64>) -> na::Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Camera centre in world space.
    pub fn origin(&self) -> na::Vector3<f64> {
        self.translation
    }
}

/// Intrinsic matrix with its inverse precomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "na::Matrix3<f64>", into = "na::Matrix3<f64>")]
pub struct CameraOptics {
    intrinsics: na::Matrix3<f64>,
    inverse: na::Matrix3<f64>,
}

impl CameraOptics {
    pub fn new(intrinsics: na::Matrix3<f64>) -> Result<CameraOptics> {
        let inverse = intrinsics
            .try_inverse()
            .ok_or(LocalizationError::SingularIntrinsics)?;
        Ok(CameraOptics {
            intrinsics,
            inverse,
        })
    }

    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<CameraOptics> {
        CameraOptics::new(na::Matrix3::new(fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0))
    }

    pub fn intrinsics(&self) -> &na::Matrix3<f64> {
        &self.intrinsics
    }

    pub fn inverse(&self) -> &na::Matrix3<f64> {
        &self.inverse
    }
}

impl TryFrom<na::Matrix3<f64>> for CameraOptics {
    type Error = LocalizationError;

    fn try_from(m: na::Matrix3<f64>) -> Result<Self> {
        CameraOptics::new(m)
    }
}

impl From<CameraOptics> for na::Matrix3<f64> {
    fn from(optics: CameraOptics) -> Self {
        optics.intrinsics
    }
}

/// Serialized capture as produced by the capture pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub time_ns: i64,
    pub depth: Option<DepthRasterRecord>,
    pub label_size: (u32, u32),
    pub pose: CameraPose,
    pub optics: CameraOptics,
    pub image_size: ImageSize,
    pub device_location: GeoCoordinate,
}

/// Everything the localization core needs from one captured frame.
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub time_ns: i64,
    depth: Option<DepthSampler>,
    pub pose: CameraPose,
    pub optics: CameraOptics,
    pub image_size: ImageSize,
    pub device_location: GeoCoordinate,
}

impl CaptureFrame {
    pub fn new(
        depth: Option<DepthSampler>,
        pose: CameraPose,
        optics: CameraOptics,
        image_size: ImageSize,
        device_location: GeoCoordinate,
    ) -> CaptureFrame {
        CaptureFrame {
            time_ns: 0,
            depth,
            pose,
            optics,
            image_size,
            device_location,
        }
    }

    /// Validates the record and builds the depth sampler for it.
    pub fn configure(record: CaptureRecord) -> Result<CaptureFrame> {
        let depth = match record.depth {
            Some(raster) => Some(DepthSampler::aligned_with(
                DepthRaster::try_from(raster)?,
                record.label_size,
            )?),
            None => None,
        };
        Ok(CaptureFrame {
            time_ns: record.time_ns,
            depth,
            pose: record.pose,
            optics: record.optics,
            image_size: record.image_size,
            device_location: record.device_location,
        })
    }

    pub fn to_record(&self) -> CaptureRecord {
        let depth = self.depth.as_ref().map(|s| DepthRasterRecord::from(s.raster()));
        let label_size = self
            .depth
            .as_ref()
            .map(|s| s.raster().dimensions())
            .unwrap_or((0, 0));
        CaptureRecord {
            time_ns: self.time_ns,
            depth,
            label_size,
            pose: self.pose.clone(),
            optics: self.optics.clone(),
            image_size: self.image_size,
            device_location: self.device_location,
        }
    }

    pub fn sampler(&self) -> Result<&DepthSampler> {
        self.depth
            .as_ref()
            .ok_or(LocalizationError::ConfigurationMissing("depth sampler"))
    }
}
