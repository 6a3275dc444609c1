use approx::assert_abs_diff_eq;
use feature_geolocation::LocalizationError;
use feature_geolocation::attributes::{
    AttributeKind, cross_slope, estimate_attributes, estimate_selected, running_slope, width,
};
use feature_geolocation::feature::GeometryClass;
use feature_geolocation::projection::RayProjector;
use feature_geolocation::synthetic::GroundScene;
use feature_geolocation::types::PointWithDepth;
use nalgebra as na;

/// Exact image samples of world corners ordered BL, TL, TR, BR.
fn exact_samples(scene: &GroundScene, corners: &[na::Vector3<f64>]) -> Vec<PointWithDepth> {
    corners
        .iter()
        .map(|c| scene.world_to_image(c).unwrap())
        .collect()
}

fn flat_path() -> Vec<na::Vector3<f64>> {
    [(-1.0, 2.0), (-1.0, 5.0), (1.0, 5.0), (1.0, 2.0)]
        .iter()
        .map(|(e, n)| GroundScene::ground_point(*e, *n))
        .collect()
}

#[test]
fn flat_two_by_three_rectangle() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let projector = RayProjector::for_frame(&frame);
    let samples = exact_samples(&scene, &flat_path());

    assert_abs_diff_eq!(width(&samples, &projector).unwrap().value, 2.0, epsilon = 0.01);
    assert_abs_diff_eq!(running_slope(&samples, &projector).unwrap().value, 0.0, epsilon = 0.1);
    assert_abs_diff_eq!(cross_slope(&samples, &projector).unwrap().value, 0.0, epsilon = 0.1);
}

#[test]
fn rectangle_measured_under_any_heading() {
    for heading in [0.0, 37.0, 90.0, 200.0] {
        let scene = GroundScene {
            heading_deg: heading,
            ..Default::default()
        };
        let frame = scene.frame().unwrap();
        let projector = RayProjector::for_frame(&frame);
        let (sin, cos) = heading.to_radians().sin_cos();
        // same footprint as flat_path, rotated to stay in front of the camera
        let corners: Vec<_> = [(-1.0, 2.0), (-1.0, 5.0), (1.0, 5.0), (1.0, 2.0)]
            .iter()
            .map(|(r, f)| GroundScene::ground_point(r * cos + f * sin, f * cos - r * sin))
            .collect();
        let samples = exact_samples(&scene, &corners);
        assert_abs_diff_eq!(width(&samples, &projector).unwrap().value, 2.0, epsilon = 0.01);
        assert_abs_diff_eq!(running_slope(&samples, &projector).unwrap().value, 0.0, epsilon = 0.1);
    }
}

#[test]
fn ramp_rises_away_from_camera() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let projector = RayProjector::for_frame(&frame);
    let corners = [
        na::Vector3::new(-0.75, 0.0, -2.0),
        na::Vector3::new(-0.75, 0.5, -5.0),
        na::Vector3::new(0.75, 0.5, -5.0),
        na::Vector3::new(0.75, 0.0, -2.0),
    ];
    let samples = exact_samples(&scene, &corners);
    let expected = (0.5f64 / 3.0).atan().to_degrees();
    assert_abs_diff_eq!(running_slope(&samples, &projector).unwrap().value, expected, epsilon = 0.1);
    assert_abs_diff_eq!(cross_slope(&samples, &projector).unwrap().value, 0.0, epsilon = 0.1);
    assert_abs_diff_eq!(width(&samples, &projector).unwrap().value, 1.5, epsilon = 0.01);
}

#[test]
fn side_slope_points_down_to_the_right() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let projector = RayProjector::for_frame(&frame);
    let corners = [
        na::Vector3::new(-1.0, 0.1, -2.0),
        na::Vector3::new(-1.0, 0.1, -5.0),
        na::Vector3::new(1.0, -0.1, -5.0),
        na::Vector3::new(1.0, -0.1, -2.0),
    ];
    let samples = exact_samples(&scene, &corners);
    let expected = (-0.2f64 / 2.0).atan().to_degrees();
    assert_abs_diff_eq!(cross_slope(&samples, &projector).unwrap().value, expected, epsilon = 0.1);
}

#[test]
fn wrong_corner_counts_are_rejected() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let projector = RayProjector::for_frame(&frame);
    let samples = exact_samples(&scene, &flat_path());

    for n in [3, 5] {
        let mut corners = samples.clone();
        corners.resize(n, samples[0]);
        for result in [
            width(&corners, &projector),
            running_slope(&corners, &projector),
            cross_slope(&corners, &projector),
        ] {
            assert_eq!(
                result,
                Err(LocalizationError::InvalidBounds {
                    expected: 4,
                    actual: n
                })
            );
        }
    }
}

#[test]
fn zero_depth_corners_have_no_slope() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let projector = RayProjector::for_frame(&frame);
    // every corner collapses onto the camera centre
    let samples: Vec<_> = exact_samples(&scene, &flat_path())
        .into_iter()
        .map(|s| PointWithDepth::new(s.point, 0.0))
        .collect();

    assert_eq!(width(&samples, &projector).unwrap().value, 0.0);
    assert_eq!(
        running_slope(&samples, &projector),
        Err(LocalizationError::DivisionByZero)
    );
    assert_eq!(
        cross_slope(&samples, &projector),
        Err(LocalizationError::DivisionByZero)
    );
}

#[test]
fn estimate_from_depth_raster() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let feature = scene
        .ground_feature(
            9,
            GeometryClass::LineString,
            &[(-1.0, 2.0), (-1.0, 5.0), (1.0, 5.0), (1.0, 2.0)],
        )
        .unwrap();

    let report = estimate_attributes(&feature, &frame);
    assert!(!report.has_failures());
    // raw lookups snap to the nearest depth pixel
    assert_abs_diff_eq!(report.width.unwrap().value, 2.0, epsilon = 0.1);
    assert_abs_diff_eq!(report.running_slope.unwrap().value, 0.0, epsilon = 2.0);
    assert_abs_diff_eq!(report.cross_slope.unwrap().value, 0.0, epsilon = 2.0);
    assert_eq!(report.measurements().count(), 3);
}

#[test]
fn each_attribute_fails_independently() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let triangle = scene
        .ground_feature(1, GeometryClass::Polygon, &[(-1.0, 2.0), (0.0, 4.0), (1.0, 2.0)])
        .unwrap();

    let report = estimate_selected(
        &triangle,
        &frame,
        &[AttributeKind::Width, AttributeKind::CrossSlope, AttributeKind::LidarDepth],
    );
    assert!(report.width.is_none());
    assert!(report.running_slope.is_none());
    let kinds: Vec<_> = report.failures.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![AttributeKind::Width, AttributeKind::CrossSlope]);
    assert!(report.failures.iter().all(|(_, e)| matches!(
        e,
        LocalizationError::InvalidBounds { expected: 4, actual: 3 }
    )));
}

#[test]
fn missing_depth_is_reported_per_attribute() {
    let scene = GroundScene {
        dropout: 1.0,
        ..Default::default()
    };
    let frame = scene.frame().unwrap();
    let feature = scene
        .ground_feature(
            2,
            GeometryClass::LineString,
            &[(-1.0, 2.0), (-1.0, 5.0), (1.0, 5.0), (1.0, 2.0)],
        )
        .unwrap();
    let report = estimate_attributes(&feature, &frame);
    assert_eq!(report.failures.len(), 3);
    assert!(matches!(
        report.failures[0].1,
        LocalizationError::InvalidDepth { index: 0, .. }
    ));
}

#[test]
fn report_json_carries_failure_reasons() {
    let scene = GroundScene::default();
    let frame = scene.frame().unwrap();
    let triangle = scene
        .ground_feature(1, GeometryClass::Polygon, &[(-1.0, 2.0), (0.0, 4.0), (1.0, 2.0)])
        .unwrap();
    let report = estimate_selected(&triangle, &frame, &[AttributeKind::Width]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json["failures"]["width"],
        LocalizationError::InvalidBounds {
            expected: 4,
            actual: 3
        }
        .to_string()
    );
    assert!(json["width"].is_null());
}
