use image::{Rgb, RgbImage};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::depth::DepthRaster;
use crate::feature::DetectedFeature;
use crate::types::NormalizedPoint;

/// Turbo-colored depth map. Invalid samples are black, anything past `max_depth` saturates.
pub fn depth_preview(raster: &DepthRaster, max_depth: f32) -> RgbImage {
    let gradient = colorous::TURBO;
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        match raster.get(x, y) {
            Some(d) if d.is_finite() && d > 0.0 => {
                let t = (d / max_depth).clamp(0.0, 1.0) as f64;
                let c = gradient.eval_continuous(t);
                Rgb([c.r, c.g, c.b])
            }
            _ => Rgb([0, 0, 0]),
        }
    })
}

pub fn id_to_color(id: u32) -> Rgb<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    Rgb([
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
    ])
}

fn to_image_xy(img: &RgbImage, p: &NormalizedPoint) -> (f32, f32) {
    (
        p.x * img.width() as f32,
        (1.0 - p.y) * img.height() as f32,
    )
}

fn draw_segment(img: &mut RgbImage, a: (f32, f32), b: (f32, f32), color: Rgb<u8>) {
    let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = a.0 + (b.0 - a.0) * t;
        let y = a.1 + (b.1 - a.1) * t;
        if x >= 0.0 && y >= 0.0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Draws each feature's closed outline in its id color.
pub fn draw_features(img: &mut RgbImage, features: &[DetectedFeature]) {
    for f in features {
        let color = id_to_color(f.id);
        let pts: Vec<_> = f.points().iter().map(|p| to_image_xy(img, p)).collect();
        for (i, a) in pts.iter().enumerate() {
            draw_segment(img, *a, pts[(i + 1) % pts.len()], color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::GeometryClass;

    #[test]
    fn invalid_depth_is_black() {
        let raster = DepthRaster::from_fn(4, 2, |x, _| if x == 0 { 0.0 } else { x as f32 });
        let img = depth_preview(&raster, 3.0);
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_ne!(img.get_pixel(3, 1), &Rgb([0, 0, 0]));
    }

    #[test]
    fn outline_lands_on_image() {
        let mut img = RgbImage::new(10, 10);
        let feature = DetectedFeature::from_points(
            4,
            GeometryClass::Polygon,
            vec![
                NormalizedPoint::new(0.5, 0.5),
                NormalizedPoint::new(0.5, 0.75),
                NormalizedPoint::new(0.75, 0.75),
            ],
        );
        draw_features(&mut img, &[feature]);
        assert_eq!(img.get_pixel(5, 5), &id_to_color(4));
    }
}
