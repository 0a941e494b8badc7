//! Command-line front end for the OCR pipeline.
//!
//! # Usage
//!
//! ```bash
//! lineocr --detection-model models/det.onnx \
//!     --recognition-model models/rec.onnx \
//!     page.png
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=lineocr=debug`.

use clap::Parser;
use lineocr::core::PipelineConfig;
use lineocr::pipeline::Orchestrator;
use lineocr::processors::DecodingPolicy;
use lineocr::utils::init_tracing;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

const RULER: &str = "----------------------------------------";

#[derive(Parser)]
#[command(name = "lineocr")]
#[command(about = "Recognize the text of an image with a detection and a recognition model")]
#[command(long_about = "Recognize the text of an image with a detection and a recognition model.\n\n\
The plain-text output ends with statistics: the word count splits on whitespace, \
and the character count counts Unicode characters (scalar values), not bytes.")]
struct Args {
    /// Image file to process.
    image: PathBuf,

    /// Path to the text detection model (ONNX).
    #[arg(long)]
    detection_model: PathBuf,

    /// Path to the text recognition model (ONNX).
    #[arg(long)]
    recognition_model: PathBuf,

    /// JSON file with pipeline configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the transcript as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Abort on the first region that fails.
    #[arg(long)]
    strict: bool,

    /// Number of regions recognized concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Per-region time budget in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Use beam search decoding with this many beams.
    #[arg(long)]
    beam_width: Option<usize>,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if self.strict {
            config = config.with_strict_mode(true);
        }
        if let Some(workers) = self.workers {
            config = config.with_worker_count(workers);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_per_region_timeout_ms(timeout_ms);
        }
        if let Some(beam_width) = self.beam_width {
            config = config
                .with_decoding_policy(DecodingPolicy::Beam)
                .with_beam_width(beam_width);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    if !args.image.exists() {
        error!("Image file not found: {}", args.image.display());
        return Err(format!("image file '{}' does not exist", args.image.display()).into());
    }

    let config = args.pipeline_config()?;
    info!(
        "Loading models {} and {}",
        args.detection_model.display(),
        args.recognition_model.display()
    );
    let ocr = Orchestrator::builder(&args.detection_model, &args.recognition_model)
        .config(config)
        .build()?;

    info!("Processing image: {}", args.image.display());
    let started = Instant::now();
    let transcript = ocr.process(&args.image).await?;
    let elapsed = started.elapsed();

    for failure in transcript.failures() {
        warn!("region {} failed ({}): {}", failure.region_id, failure.kind, failure.message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
        return Ok(());
    }

    let text = transcript.text();
    println!("\nProcessing completed in {:.2} seconds.\n", elapsed.as_secs_f64());
    println!("Recognized text:");
    println!("{RULER}");
    println!("{text}");
    println!("{RULER}");

    println!("\nStatistics:");
    println!("Word count: {}", word_count(&text));
    println!("Character count: {}", character_count(&text));
    if !transcript.failures().is_empty() {
        println!("Failed regions: {}", transcript.failures().len());
    }
    Ok(())
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Unicode scalar values, so "é" counts once even though it is two bytes.
fn character_count(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_count_ignores_utf8_width() {
        assert_eq!(character_count("café"), 4);
        assert_eq!("café".len(), 5);
        assert_eq!(character_count("HELLO WORLD\nAB"), 14);
    }

    #[test]
    fn test_word_count_splits_lines_and_spaces() {
        assert_eq!(word_count("HELLO WORLD\nAB"), 3);
        assert_eq!(word_count(""), 0);
    }
}
