use feature_geolocation::LocalizationError;
use feature_geolocation::depth::{DepthRaster, DepthSampler};
use feature_geolocation::synthetic::GroundScene;
use feature_geolocation::types::NormalizedPoint;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn zero_radius_is_the_centre_pixel() {
    let scene = GroundScene {
        noise: 0.05,
        seed: 11,
        ..Default::default()
    };
    let raster = scene.depth_raster().unwrap();
    let sampler = DepthSampler::new(raster);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..100 {
        // lower half of the image always sees the ground
        let p = NormalizedPoint::new(rng.random_range(0.0..1.0), rng.random_range(0.0..0.5));
        let (x, y) = sampler.pixel_of(&p).unwrap();
        assert_eq!(
            sampler.averaged_depth_in_radius(&p, 0).unwrap(),
            sampler.depth_at(x, y).unwrap()
        );
    }
}

#[test]
fn all_invalid_neighbourhood_has_no_depth() {
    let raster = DepthRaster::from_fn(16, 16, |x, y| match (x + y) % 3 {
        0 => f32::NAN,
        1 => 0.0,
        _ => -2.0,
    });
    let sampler = DepthSampler::new(raster);
    assert_eq!(
        sampler.averaged_depth_in_radius(&NormalizedPoint::new(0.5, 0.5), 4),
        Err(LocalizationError::NoValidDepth { radius: 4 })
    );
}

#[test]
fn radius_near_the_border_uses_what_is_inside() {
    let raster = DepthRaster::from_fn(8, 8, |_, _| 2.5);
    let sampler = DepthSampler::new(raster);
    let corner = NormalizedPoint::new(0.0, 1.0);
    assert_eq!(sampler.averaged_depth_in_radius(&corner, 3), Ok(2.5));
}

#[test]
fn raw_lookups_keep_invalid_values() {
    let raster = DepthRaster::from_fn(4, 4, |x, _| if x == 0 { f32::NAN } else { x as f32 });
    let sampler = DepthSampler::new(raster);
    let depths = sampler
        .depths_at(&[NormalizedPoint::new(0.1, 0.5), NormalizedPoint::new(0.9, 0.5)])
        .unwrap();
    assert!(depths[0].is_nan());
    assert_eq!(depths[1], 3.0);
}

#[test]
fn oversized_radius_is_bounded_by_the_raster() {
    let raster = DepthRaster::from_fn(4, 4, |x, y| (1 + x + 4 * y) as f32);
    let sampler = DepthSampler::new(raster);
    let centre = NormalizedPoint::new(0.5, 0.5);
    let everything = sampler.averaged_depth_in_radius(&centre, u32::MAX).unwrap();
    assert_eq!(everything, 8.5);
    assert_eq!(sampler.averaged_depth_in_radius(&centre, 4).unwrap(), everything);
    assert_eq!(
        DepthSampler::new(DepthRaster::from_fn(4, 4, |_, _| 0.0))
            .averaged_depth_in_radius(&centre, u32::MAX),
        Err(LocalizationError::NoValidDepth { radius: u32::MAX })
    );
}
