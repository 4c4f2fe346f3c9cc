//! Run the SeetaFace backend over images and print the faces found.
//!
//! Usage:
//!   cargo run --example detect_faces -- --weights-dir model --threshold 0.6 photo.jpg
//!
//! Set `RUST_LOG=debug` to see downscaling and model build logs.

use std::path::PathBuf;

use clap::Parser;
use facedetect::{
    Configurable, DetectionCollector, FaceDetectionTask, ModelOptions, Runnable, RustfaceProvider,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "detect_faces")]
#[command(about = "Detect faces and print boxes in source-image pixels")]
struct Args {
    /// Directory holding seeta_fd_frontal_v1.0.bin
    #[arg(short, long)]
    weights_dir: Option<PathBuf>,

    /// Minimum confidence for a reported face
    #[arg(short, long, default_value = "0.6")]
    threshold: f32,

    /// Images to process
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let options = ModelOptions {
        weights_dir: args.weights_dir,
    };
    let task = FaceDetectionTask::new(Box::new(RustfaceProvider), options);

    let mut config = task.configuration();
    config.confidence_threshold = args.threshold;
    task.set_configuration(config)?;

    for path in &args.images {
        let image = image::open(path)?;
        let (width, height) = (image.width(), image.height());
        let mut sink = DetectionCollector::default();
        task.run(image, &mut sink)?;

        println!("=== {} ({width}x{height}) ===", path.display());
        if sink.detections.is_empty() {
            println!("  no faces above {:.2}", args.threshold);
        }
        for face in &sink.detections {
            println!(
                "  face {}: score={:.2}, bbox=({:.0}, {:.0}, {:.0}x{:.0})",
                face.index, face.confidence, face.x, face.y, face.width, face.height
            );
        }
    }

    Ok(())
}
