use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use feature_geolocation::batch::process_features;
use feature_geolocation::config::EstimatorConfig;
use feature_geolocation::feature::GeometryClass;
use feature_geolocation::io::{
    CaptureFile, FrameReport, load_capture, object_from_json, object_to_json, write_image, write_report,
};
use feature_geolocation::synthetic::GroundScene;
use feature_geolocation::visualization::{depth_preview, draw_features};
use glob::glob;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

#[derive(Parser)]
#[command(version, about, author)]
struct GeolocCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geolocate and measure the features of every capture file
    Localize {
        /// glob for capture json files, e.g. "captures/*.json"
        frames: String,

        #[arg(short, long, default_value = "report.json")]
        output: String,

        /// estimator config json
        #[arg(short, long)]
        config: Option<String>,

        /// override the centroid sampling radius in depth pixels
        #[arg(long)]
        radius: Option<u32>,

        /// fail line and polygon features instead of falling back to the centroid
        #[arg(long)]
        no_fallback: bool,
    },
    /// Generate synthetic ground plane captures
    Generate {
        /// output directory
        #[arg(short, long)]
        output: String,

        /// scene json, defaults are used for missing fields
        #[arg(short, long)]
        scene: Option<String>,

        #[arg(short, long, default_value = "4")]
        num_frames: usize,

        /// heading change between frames in degrees
        #[arg(long, default_value = "15.0")]
        turn: f64,

        /// also write a colored depth png per frame
        #[arg(long)]
        preview: bool,
    },
}

fn capture_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    match rp {
        Ok(p) if p.extension().is_some_and(|e| e == "json") => Some(p),
        _ => None,
    }
}

fn localize(
    pattern: &str,
    output: &str,
    config: EstimatorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = glob(pattern)?.filter_map(capture_filter).collect();
    paths.sort();
    if paths.is_empty() {
        return Err(format!("no capture files match {}", pattern).into());
    }
    log::info!("{} capture files, {:?}", paths.len(), config);

    let now = Instant::now();
    let frames: Vec<FrameReport> = paths
        .par_iter()
        .progress_count(paths.len() as u64)
        .filter_map(|path| match load_capture(path) {
            Ok((frame, features)) => Some(FrameReport {
                source: path.to_string_lossy().to_string(),
                time_ns: frame.time_ns,
                features: process_features(&features, &frame, &config),
            }),
            Err(e) => {
                log::error!("skipping {}", e);
                None
            }
        })
        .collect();
    let duration_sec = now.elapsed().as_secs_f64();
    println!("localizing {} frames took {:.6} sec", frames.len(), duration_sec);

    write_report(output, &frames)?;
    println!("report written to {}", output);
    Ok(())
}

/// East/north of a ground point `right`/`forward` meters relative to the camera heading.
fn ahead(scene: &GroundScene, right: f64, forward: f64) -> (f64, f64) {
    let (sin, cos) = scene.heading_deg.to_radians().sin_cos();
    (right * cos + forward * sin, forward * cos - right * sin)
}

fn generate(
    output_dir: &str,
    scene: GroundScene,
    num_frames: usize,
    turn: f64,
    preview: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output_dir)?;

    for frame_idx in 0..num_frames {
        let scene = GroundScene {
            heading_deg: scene.heading_deg + turn * frame_idx as f64,
            seed: scene.seed + frame_idx as u64,
            ..scene.clone()
        };
        let mut frame = scene.frame()?;
        frame.time_ns = frame_idx as i64 * 100000000;

        let layout = |points: &[(f64, f64)]| -> Vec<(f64, f64)> {
            points.iter().map(|&(r, f)| ahead(&scene, r, f)).collect()
        };
        let path = scene.ground_feature(
            0,
            GeometryClass::LineString,
            &layout(&[(-1.0, 2.0), (-1.0, 5.0), (1.0, 5.0), (1.0, 2.0)]),
        );
        let pole = scene.ground_feature(1, GeometryClass::Point, &layout(&[(0.6, 3.0)]));
        let curb_ramp = scene.ground_feature(
            2,
            GeometryClass::Polygon,
            &layout(&[(-0.8, 2.5), (-0.5, 3.2), (0.4, 3.4), (0.7, 2.6)]),
        );
        let features: Vec<_> = [path, pole, curb_ramp]
            .into_iter()
            .flatten()
            .map(|mut f| {
                f.id += frame_idx as u32 * 10;
                f
            })
            .collect();

        let stem = Path::new(output_dir).join(format!("{:06}", frame_idx));
        object_to_json(
            &stem.with_extension("json").to_string_lossy(),
            &CaptureFile::new(&frame, features.clone()),
        )?;

        if preview {
            let mut img = depth_preview(frame.sampler()?.raster(), 8.0);
            draw_features(&mut img, &features);
            write_image(&stem.with_extension("png"), &img)?;
        }
    }

    println!("Generated {} frames in {}", num_frames, output_dir);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = GeolocCli::parse();

    match cli.command {
        Commands::Localize {
            frames,
            output,
            config,
            radius,
            no_fallback,
        } => {
            let mut config = match config {
                Some(path) => object_from_json::<EstimatorConfig>(&path)?,
                None => EstimatorConfig::default(),
            };
            if let Some(radius) = radius {
                config.centroid_radius_px = radius;
            }
            if no_fallback {
                config.fallback_to_centroid = false;
            }
            localize(&frames, &output, config)
        }
        Commands::Generate {
            output,
            scene,
            num_frames,
            turn,
            preview,
        } => {
            let scene = match scene {
                Some(path) => object_from_json::<GroundScene>(&path)?,
                None => GroundScene::default(),
            };
            generate(&output, scene, num_frames, turn, preview)
        }
    }
}
