//! The OCR pipeline orchestrator.
//!
//! Runs load -> detect -> reading order -> per-region (rectify -> recognize
//! -> decode) -> assembly for one image at a time. Detection and assembly
//! are sequential; per-region work runs on tokio's blocking pool, bounded by
//! a semaphore of `worker_count` permits.

use super::builder::OrchestratorBuilder;
use super::source::ImageSource;
use crate::core::inference::InferenceEngine;
use crate::core::{OCRError, PipelineConfig};
use crate::domain::{
    DetectedRegion, Image, RegionFailure, RegionId, Transcript, TranscriptEntry, Vocabulary,
};
use crate::models::{TextDetector, TextRecognizer};
use crate::processors::{CTCDecoder, DecodedText, RegionRectifier, reading_order};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-region stages, shared read-only by every worker.
#[derive(Debug)]
struct RegionWorker {
    rectifier: RegionRectifier,
    recognizer: TextRecognizer,
    decoder: CTCDecoder,
}

impl RegionWorker {
    fn run(&self, image: &Image, region: &DetectedRegion) -> Result<DecodedText, OCRError> {
        let strip = self.rectifier.rectify(image, region)?;
        let lattice = self.recognizer.recognize(&strip)?;
        let decoded = self.decoder.decode(&lattice);
        debug!(
            "region {}: strip {}x{}, {} steps -> {:?} ({:.3})",
            region.id,
            strip.width(),
            strip.height(),
            lattice.time_steps(),
            decoded.text,
            decoded.confidence
        );
        Ok(decoded)
    }
}

/// Two-model OCR pipeline.
///
/// Both models are loaded once and shared through `Arc`, so one orchestrator
/// can serve any number of concurrent `process` calls.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    detector: Arc<TextDetector>,
    worker: Arc<RegionWorker>,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Starts building an orchestrator from two ONNX model files.
    pub fn builder(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder::new(detection_model, recognition_model)
    }

    /// Creates an orchestrator over already loaded engines.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::ConfigError` if `config` does not validate.
    pub fn from_engines(
        detection: Arc<dyn InferenceEngine>,
        recognition: Arc<dyn InferenceEngine>,
        config: PipelineConfig,
        vocabulary: Vocabulary,
    ) -> Result<Self, OCRError> {
        config.validate()?;
        let vocabulary = Arc::new(vocabulary);
        let detector = TextDetector::new(detection, &config);
        let recognizer = TextRecognizer::new(recognition, &config, Arc::clone(&vocabulary));
        let worker = RegionWorker {
            rectifier: RegionRectifier::new(config.strip_height, config.max_strip_width),
            recognizer,
            decoder: CTCDecoder::new(config.decoding_policy, config.beam_width, vocabulary),
        };
        info!(
            "Pipeline ready: detector '{}', recognizer '{}', {} worker(s), {:?} decoding",
            detector.model_name(),
            worker.recognizer.model_name(),
            config.worker_count,
            config.decoding_policy
        );
        Ok(Self {
            detector: Arc::new(detector),
            worker: Arc::new(worker),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Recognizes the text of an image file.
    pub async fn process(&self, path: impl AsRef<Path>) -> Result<Transcript, OCRError> {
        self.process_with_cancel(path.as_ref(), &CancellationToken::new())
            .await
    }

    /// Recognizes the text of an already decoded image.
    pub async fn process_image(&self, image: Image) -> Result<Transcript, OCRError> {
        self.process_with_cancel(image, &CancellationToken::new())
            .await
    }

    /// Recognizes the text of an image, stopping dispatch when `cancel` fires.
    ///
    /// Regions already handed to a worker are awaited (each bounded by the
    /// per-region timeout); regions never dispatched are listed as skipped
    /// and the transcript status is `Cancelled`.
    ///
    /// # Errors
    ///
    /// Load and detection errors abort the call. Per-region errors are
    /// recorded in the transcript, unless `strict_mode` is set, in which case
    /// the first one is returned as `OCRError::RegionFailed`.
    pub async fn process_with_cancel(
        &self,
        source: impl Into<ImageSource>,
        cancel: &CancellationToken,
    ) -> Result<Transcript, OCRError> {
        let started = Instant::now();
        let image = self.load(source.into()).await?;
        info!("Loaded {}x{} image", image.width(), image.height());

        let regions = self.detect(image.clone()).await?;
        info!(
            "Detected {} region(s) in {:.2?}",
            regions.len(),
            started.elapsed()
        );
        if regions.is_empty() {
            return Ok(Transcript::empty());
        }

        let ordered = self.order_regions(regions);
        let transcript = self.recognize_all(image, ordered, cancel).await?;
        info!(
            "Recognized {} of {} region(s) in {:.2?} ({:?})",
            transcript.entries().len(),
            transcript.entries().len() + transcript.failures().len() + transcript.skipped().len(),
            started.elapsed(),
            transcript.status()
        );
        Ok(transcript)
    }

    async fn load(&self, source: ImageSource) -> Result<Image, OCRError> {
        match source {
            ImageSource::Image(image) => Ok(image),
            other => tokio::task::spawn_blocking(move || other.load())
                .await
                .map_err(|e| OCRError::Io(std::io::Error::other(e)))?,
        }
    }

    async fn detect(&self, image: Image) -> Result<Vec<DetectedRegion>, OCRError> {
        let detector = Arc::clone(&self.detector);
        let handle = tokio::task::spawn_blocking(move || detector.detect(&image));
        let joined = match self.config.detection_timeout() {
            Some(budget) => tokio::time::timeout(budget, handle).await.map_err(|_| {
                OCRError::inference_message(
                    self.detector.model_name(),
                    format!("detection exceeded its timeout of {} ms", budget.as_millis()),
                )
            })?,
            None => handle.await,
        };
        joined.map_err(|e| task_failed(self.detector.model_name(), e))?
    }

    /// Sorts regions into reading order, pairing each with its line index.
    fn order_regions(&self, regions: Vec<DetectedRegion>) -> Vec<(usize, DetectedRegion)> {
        let polygons: Vec<_> = regions.iter().map(|r| &r.polygon).collect();
        let rows = reading_order(&polygons, self.config.line_height_tolerance);
        debug!("{} region(s) in {} line(s)", regions.len(), rows.len());

        let mut slots: Vec<Option<DetectedRegion>> = regions.into_iter().map(Some).collect();
        rows.into_iter()
            .enumerate()
            .flat_map(|(line, row)| row.into_iter().map(move |index| (line, index)))
            .filter_map(|(line, index)| slots[index].take().map(|region| (line, region)))
            .collect()
    }

    async fn recognize_all(
        &self,
        image: Image,
        ordered: Vec<(usize, DetectedRegion)>,
        cancel: &CancellationToken,
    ) -> Result<Transcript, OCRError> {
        let semaphore = Arc::new(Semaphore::new(self.config.worker_count.max(1)));
        let budget = self.config.per_region_timeout();
        let model_name = self.worker.recognizer.model_name().to_string();
        let mut tasks = JoinSet::new();
        let mut outcomes: HashMap<RegionId, Result<DecodedText, OCRError>> = HashMap::new();
        let mut skipped = Vec::new();
        let mut cancelled = false;

        for (position, (_, region)) in ordered.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                cancelled = true;
                skipped.extend(ordered[position..].iter().map(|(_, r)| r.id));
                info!("Cancelled with {} region(s) not dispatched", skipped.len());
                break;
            };

            let worker = Arc::clone(&self.worker);
            let image = image.clone();
            let region = region.clone();
            let task_model = model_name.clone();
            tasks.spawn(async move {
                let region_id = region.id;
                // The permit moves into the blocking task so a region that
                // outlives its timeout keeps its worker slot until it returns.
                let handle = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    worker.run(&image, &region)
                });
                let outcome = match tokio::time::timeout(budget, handle).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => Err(task_failed(&task_model, e)),
                    Err(_) => Err(OCRError::inference_timeout(region_id, budget)),
                };
                (region_id, outcome)
            });

            while let Some(joined) = tasks.try_join_next() {
                self.record(joined, &model_name, &mut outcomes, &mut tasks)?;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            self.record(joined, &model_name, &mut outcomes, &mut tasks)?;
        }

        let mut entries = Vec::with_capacity(ordered.len());
        let mut failures = Vec::new();
        for (line, region) in ordered {
            match outcomes.remove(&region.id) {
                Some(Ok(decoded)) => entries.push(TranscriptEntry {
                    region_id: region.id,
                    text: decoded.text,
                    confidence: decoded.confidence,
                    line,
                    polygon: region.polygon,
                }),
                Some(Err(error)) => failures.push(RegionFailure::from_error(region.id, &error)),
                None => {}
            }
        }
        Ok(Transcript::new(entries, failures, skipped, cancelled))
    }

    /// Stores a finished region. In strict mode a failure aborts the rest.
    fn record(
        &self,
        joined: Result<(RegionId, Result<DecodedText, OCRError>), JoinError>,
        model_name: &str,
        outcomes: &mut HashMap<RegionId, Result<DecodedText, OCRError>>,
        tasks: &mut JoinSet<(RegionId, Result<DecodedText, OCRError>)>,
    ) -> Result<(), OCRError> {
        let (region_id, outcome) = joined.map_err(|e| task_failed(model_name, e))?;
        match outcome {
            Ok(decoded) => {
                outcomes.insert(region_id, Ok(decoded));
            }
            Err(error) if self.config.strict_mode => {
                warn!("region {region_id} failed, aborting: {error}");
                tasks.abort_all();
                return Err(OCRError::region_failed(region_id, error));
            }
            Err(error) => {
                warn!("region {region_id} failed: {error}");
                outcomes.insert(region_id, Err(error));
            }
        }
        Ok(())
    }
}

fn task_failed(model_name: &str, error: JoinError) -> OCRError {
    OCRError::inference_error(model_name, "worker task did not complete", error)
}
