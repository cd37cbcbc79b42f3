//! Runs the blob pipeline over a generated scene and prints the identities.
//!
//! Blobs are diamonds bouncing inside a 640x480 region. One of them hides
//! for a few frames halfway through so the lost/revive path shows up.

use blobtrack_rs::{BlobPipeline, PipelineConfig, Shape, TrackerKind};
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Point2;
use std::{env, error::Error, fs, path::PathBuf};

const WIDTH: f32 = 640.0;
const HEIGHT: f32 = 480.0;

#[derive(Debug, Clone)]
struct Blob {
    center: Point2<f32>,
    velocity: (f32, f32),
    radius: f32,
}

impl Blob {
    fn step(&mut self) {
        self.center.x += self.velocity.0;
        self.center.y += self.velocity.1;
        if self.center.x - self.radius < 0.0 || self.center.x + self.radius > WIDTH {
            self.velocity.0 = -self.velocity.0;
        }
        if self.center.y - self.radius < 0.0 || self.center.y + self.radius > HEIGHT {
            self.velocity.1 = -self.velocity.1;
        }
    }

    fn outline(&self) -> Shape {
        let (cx, cy, r) = (self.center.x, self.center.y, self.radius);
        Shape::from_polygon(vec![
            Point2::new(cx, cy - r),
            Point2::new(cx + r, cy),
            Point2::new(cx, cy + r),
            Point2::new(cx - r, cy),
        ])
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        return Ok(());
    }

    let num_frames = args
        .get(1)
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    let config = match args.get(2).map(PathBuf::from) {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };

    let mut pipeline = BlobPipeline::new(&config)?;
    let mut blobs = vec![
        Blob { center: Point2::new(100.0, 100.0), velocity: (3.0, 2.0), radius: 25.0 },
        Blob { center: Point2::new(400.0, 300.0), velocity: (-2.5, 1.5), radius: 35.0 },
        Blob { center: Point2::new(250.0, 400.0), velocity: (1.0, -3.0), radius: 20.0 },
    ];
    let hidden = (num_frames / 2)..(num_frames / 2 + 5);

    let progress = ProgressBar::new(num_frames as u64);
    let style = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )?
    .progress_chars("=>-");
    progress.set_style(style);
    progress.set_message("tracking");

    let mut centroid_frames = 0usize;
    for frame in 0..num_frames {
        blobs.iter_mut().for_each(Blob::step);
        let shapes = blobs
            .iter()
            .enumerate()
            .filter(|(i, _)| !(*i == 1 && hidden.contains(&frame)))
            .map(|(_, blob)| blob.outline())
            .collect::<Vec<_>>();

        let result = pipeline.process(&shapes);
        if result.source == TrackerKind::Centroid {
            centroid_frames += 1;
        }
        if frame % 20 == 0 {
            let line = result
                .blobs
                .iter()
                .map(|blob| {
                    let (x, y) = blob.normalized_center(WIDTH, HEIGHT);
                    format!("#{} ({:.3}, {:.3})", blob.track_id, x, y)
                })
                .collect::<Vec<_>>()
                .join(" ");
            progress.println(format!("frame {:>4}: {}", frame + 1, line));
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    let stats = pipeline.stats();
    println!(
        "{} frames, {} ids issued, {} active, {} lost, {} centroid frames",
        stats.frame_id, stats.total_tracks, stats.active_tracks, stats.lost_tracks, centroid_frames
    );

    Ok(())
}

fn print_usage() {
    println!(
        "Usage: cargo run --example synthetic_blobs [num_frames] [config.json]\n\
Defaults:\n\
  num_frames: 120\n\
  config.json: built-in defaults"
    );
}
