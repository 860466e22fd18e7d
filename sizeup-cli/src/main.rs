// sizeup Command Line Interface
// Estimate what an object is, how far away it is and how much it holds from one photo

mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sizeup_core::{
    normalize_local, BoundingBox, CalibrationInput, Detection, Shape, TargetSelector,
};
use sizeup_eye::{build_source, Backend, CaptureSession, EyeError, SizeupConfig, StillImageCamera};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sizeup")]
#[command(about = "Approximate object distance and volume from a single photo", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the object in a photo and estimate its distance and volume
    Analyze {
        /// Photo taken by the device camera
        #[arg(long, short)]
        image: PathBuf,

        /// Detection backend (local or openai)
        #[arg(long, short)]
        backend: Option<Backend>,

        /// Real object height in centimeters
        #[arg(long)]
        height_cm: Option<f64>,

        /// Assumed shape (box or cylinder)
        #[arg(long)]
        shape: Option<Shape>,

        /// Only consider these classes (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate from a known bounding box without running a detector
    Estimate {
        /// Object class, used to look up a size prior
        #[arg(long, short)]
        label: String,

        /// Bounding box width in pixels
        #[arg(long, allow_negative_numbers = true)]
        width: f64,

        /// Bounding box height in pixels
        #[arg(long, allow_negative_numbers = true)]
        height: f64,

        /// Frame height in pixels, the default focal length
        #[arg(long, default_value = "1080")]
        frame_height: u32,

        /// Real object height in centimeters
        #[arg(long)]
        height_cm: Option<f64>,

        /// Assumed shape (box or cylinder)
        #[arg(long)]
        shape: Option<Shape>,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in object size priors
    Priors,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SizeupConfig> {
    match path {
        Some(path) => {
            let config = SizeupConfig::from_file(path)
                .with_context(|| format!("loading configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None => Ok(SizeupConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Analyze { image, backend, height_cm, shape, targets, json } => {
            if let Some(backend) = backend {
                config.detector.backend = backend;
            }
            if !targets.is_empty() {
                config.detector.target_classes = targets;
            }
            config.validate().map_err(anyhow::Error::msg)?;

            let shape = shape.unwrap_or(config.estimator.default_shape);
            let calibration = CalibrationInput::from_centimeters(height_cm, shape);

            if let Err(err) = analyze(config, image, calibration, json).await {
                eprintln!("❌ {}", err.user_message());
                debug!("Analysis failed: {:?}", err);
                std::process::exit(1);
            }
        }
        Commands::Estimate { label, width, height, frame_height, height_cm, shape, json } => {
            let shape = shape.unwrap_or(config.estimator.default_shape);
            let calibration = CalibrationInput::from_centimeters(height_cm, shape);
            let detection = Detection::new(label, 1.0, BoundingBox::new(0.0, 0.0, width, height));
            let focal = config.estimator.focal_length_for(frame_height);

            let analysis = normalize_local(&[detection], &TargetSelector::default(), &calibration, focal)?;
            output::print_analysis(&analysis, json)?;
        }
        Commands::Priors => {
            output::print_priors();
        }
    }

    Ok(())
}

async fn analyze(
    config: SizeupConfig,
    image: PathBuf,
    calibration: CalibrationInput,
    json: bool,
) -> Result<(), EyeError> {
    let config = Arc::new(config);
    let camera = Arc::new(StillImageCamera::new(&image));
    let source = build_source(&config)?;

    let mut session = CaptureSession::new(config, camera, source);
    session.setup().await?;
    session.capture()?;

    let analysis = session.analyze(&calibration).await?;
    output::print_analysis(analysis, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "sizeup", "analyze", "--image", "bin.jpg", "--backend", "openai", "--height-cm", "95",
            "--shape", "cylinder", "--target", "trash bin", "--target", "bin",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze { image, backend, height_cm, shape, targets, json } => {
                assert_eq!(image, PathBuf::from("bin.jpg"));
                assert_eq!(backend, Some(Backend::OpenAi));
                assert_eq!(height_cm, Some(95.0));
                assert_eq!(shape, Some(Shape::Cylinder));
                assert_eq!(targets, vec!["trash bin", "bin"]);
                assert!(!json);
            }
            _ => panic!("Expected analyze command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_shape() {
        assert!(Cli::try_parse_from(["sizeup", "analyze", "--image", "x.jpg", "--shape", "sphere"]).is_err());
    }

    #[test]
    fn test_parse_estimate_defaults() {
        let cli = Cli::try_parse_from(["sizeup", "estimate", "--label", "cup", "--width", "80", "--height", "120"])
            .unwrap();
        match cli.command {
            Commands::Estimate { frame_height, height_cm, .. } => {
                assert_eq!(frame_height, 1080);
                assert_eq!(height_cm, None);
            }
            _ => panic!("Expected estimate command"),
        }
    }
}
