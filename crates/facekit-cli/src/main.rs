use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facekit_core::{similarity, FeatureExtractor, RecognitionConfig};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facekit", about = "facekit appearance-feature tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract appearance features from a face photo
    Extract {
        /// Path to the image file
        image: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Compare the appearance features of two face photos
    Compare {
        /// First image
        a: PathBuf,
        /// Second image
        b: PathBuf,
        /// TOML recognition config (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { image, pretty } => {
            let extractor = FeatureExtractor::new();
            let features = extractor
                .extract_path(&image)
                .with_context(|| format!("failed to extract features from {}", image.display()))?;
            let out = if pretty {
                serde_json::to_string_pretty(&features)?
            } else {
                serde_json::to_string(&features)?
            };
            println!("{out}");
        }
        Commands::Compare { a, b, config } => {
            let config = load_config(config.as_deref())?;
            let extractor = FeatureExtractor::new();
            let fa = extractor
                .extract_path(&a)
                .with_context(|| format!("failed to extract features from {}", a.display()))?;
            let fb = extractor
                .extract_path(&b)
                .with_context(|| format!("failed to extract features from {}", b.display()))?;
            let (score, detail) = similarity::compare(&fa, &fb, &config.feature_weights);
            let out = json!({
                "feature_score": score,
                "features_compared": detail.len(),
                "detail": detail,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<RecognitionConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => RecognitionConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}
