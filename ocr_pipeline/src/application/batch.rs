// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch Façade (§4.6)
//!
//! Thin operational layer sitting above the scheduler: resolves the
//! caller's file/directory inputs, loads each image, dispatches the ones
//! that loaded to [`crate::infrastructure::scheduler::run_scheduler`], and
//! assembles the [`BatchResult`] handed back to the demonstration binary.
//!
//! A file that fails to load never becomes an `ImageJob` — it is recorded
//! directly into the error map here, before the scheduler ever sees it
//! (§4.6 "Unsupported or unreadable images produce a per-file error that is
//! aggregated ... never panicking the batch").

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ocr_pipeline_bootstrap::shutdown::CancellationToken;
use ocr_pipeline_domain::entities::{BatchStats, ImageJob, ImageResult};
use ocr_pipeline_domain::error::PipelineError;
use ocr_pipeline_domain::services::{ImageLoader, ResourceMonitor};
use ocr_pipeline_domain::value_objects::{PipelineConfig, WorkerCount};

use super::discovery::discover;
use crate::infrastructure::progress::ConsoleProgressObserver;
use crate::infrastructure::resource::WorkerBudget;
use crate::infrastructure::scheduler::run_scheduler;
use crate::infrastructure::stages::{SingleImageExecutor, StageSet};

/// How often the Worker Budget ticker re-samples resource pressure (§4.2
/// default interval); not currently exposed as a configuration knob since
/// no caller has asked for one different from the spec's stated default.
const TICKER_INTERVAL: Duration = Duration::from_millis(500);

/// Everything the scheduler's [`crate::infrastructure::scheduler::SchedulerOutcome`]
/// carries, plus the two formatter hooks named in §6: `save` and
/// `print_stats`, both of which delegate to [`crate::presentation`].
pub struct BatchResult {
    /// One slot per discovered input, in discovery order; `None` at an
    /// index means that image failed (see `errors`) or was never reached
    /// before cancellation.
    pub results: Vec<Option<ImageResult>>,
    pub errors: HashMap<PathBuf, PipelineError>,
    pub stats: BatchStats,
    pub cancelled: bool,
}

impl BatchResult {
    /// Writes this result to `output_path` in `format` (`"text" | "json" |
    /// "csv"`, §10.1). `quiet` suppresses the confirmation line the text
    /// formatter would otherwise print to stderr.
    pub fn save(&self, format: &str, output_path: &Path, quiet: bool) -> Result<(), PipelineError> {
        crate::presentation::save(self, format, output_path, quiet)
    }

    /// Prints the run's `BatchStats` to stdout unless `quiet` is set.
    pub fn print_stats(&self, quiet: bool) {
        if !quiet {
            crate::presentation::print_stats(&self.stats);
        }
    }

    /// Renders this result in `format` without writing anywhere, for a
    /// caller that wants the report on stdout rather than in a file.
    pub fn render(&self, format: &str) -> Result<String, PipelineError> {
        crate::presentation::render(self, format)
    }
}

/// Runs one batch end to end: discover → load → schedule → assemble.
///
/// Returns `Err` only for a batch-fatal failure (`PipelineError::Config`/
/// `Resolve`, or an I/O error discovering the *inputs themselves* — a
/// missing top-level directory, say). Per-file load failures and per-image
/// stage failures are always aggregated into `BatchResult.errors` instead.
pub async fn run_batch(
    inputs: Vec<PathBuf>,
    config: Arc<PipelineConfig>,
    loader: Arc<dyn ImageLoader>,
    stages: StageSet,
    resource_monitor: Arc<dyn ResourceMonitor>,
    cancel: CancellationToken,
) -> Result<BatchResult, PipelineError> {
    let discovered = discover(&inputs, &config.discovery)?;
    let total = discovered.len();

    let mut jobs = Vec::with_capacity(total);
    let mut errors: HashMap<PathBuf, PipelineError> = HashMap::new();
    for (index, path) in discovered.into_iter().enumerate() {
        match loader.load(&path) {
            Ok(image) => jobs.push(ImageJob::new(index, image, path)),
            Err(e) => {
                errors.insert(path, e);
            }
        }
    }

    let workers = WorkerCount::new(config.parallel.workers);
    let min_workers = WorkerCount::new(WorkerCount::MIN_WORKERS);
    let budget = Arc::new(WorkerBudget::new(workers, min_workers, workers, config.parallel.adaptive_scaling));

    let ticker_handle = tokio::spawn(WorkerBudget::run_ticker(
        Arc::clone(&budget),
        Arc::clone(&resource_monitor),
        config.parallel.memory_threshold,
        config.low_pressure_mark(),
        TICKER_INTERVAL,
        cancel.clone(),
    ));

    let progress: Option<Arc<dyn ocr_pipeline_domain::services::ProgressObserver>> =
        if config.parallel.show_progress { Some(Arc::new(ConsoleProgressObserver)) } else { None };

    let executor = Arc::new(SingleImageExecutor::new(stages, Arc::clone(&config)));
    let outcome =
        run_scheduler(jobs, total, executor, Arc::clone(&budget), &config.parallel, cancel, progress).await;

    // The ticker has no state worth draining; once the scheduler is done
    // there is nothing left for it to regulate.
    ticker_handle.abort();

    errors.extend(outcome.errors);
    let stats = BatchStats::new(total, outcome.stats.processed, errors.len(), outcome.stats.workers, outcome.stats.elapsed);

    Ok(BatchResult { results: outcome.results, errors, stats, cancelled: outcome.cancelled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_pipeline_domain::entities::DecodedImage;
    use ocr_pipeline_domain::services::{
        Capability, DetectEngine, Detection, Reading, RecogniseEngine, RecognisedText, RegionCrop,
    };
    use ocr_pipeline_domain::value_objects::{BoundingBox, FileDiscoveryConfig, Polygon};
    use ocr_pipeline_bootstrap::shutdown::ShutdownCoordinator;
    use std::fs;

    struct FixedLoader;
    impl ImageLoader for FixedLoader {
        fn load(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
            if path.to_string_lossy().contains("bad") {
                return Err(PipelineError::Io("simulated decode failure".into()));
            }
            Ok(DecodedImage::new(8, 8, vec![0u8; 8]))
        }
    }

    struct NoPressureMonitor;
    impl ResourceMonitor for NoPressureMonitor {
        fn sample(&self) -> Reading {
            Reading::no_pressure()
        }
    }

    struct OneRegionDetect;
    impl DetectEngine for OneRegionDetect {
        fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
            Ok(vec![Detection { bbox: BoundingBox::new(0, 0, 4, 4), polygon: Polygon::new(vec![]), confidence: 0.9 }])
        }
    }

    struct EchoRecognise;
    impl RecogniseEngine for EchoRecognise {
        fn predict(&self, _region: &RegionCrop) -> Result<RecognisedText, PipelineError> {
            Ok(RecognisedText { text: "x".into(), confidence: 0.9, language: "en".into() })
        }
    }

    fn stages() -> StageSet {
        StageSet { orient: Capability::Absent, rectify: Capability::Absent, detect: Arc::new(OneRegionDetect), recognise: Arc::new(EchoRecognise) }
    }

    #[tokio::test]
    async fn batch_aggregates_load_failures_without_halting() {
        let dir = std::env::temp_dir().join(format!("ocr-pipeline-batch-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.ppm");
        let bad = dir.join("bad.ppm");
        fs::write(&good, b"fake").unwrap();
        fs::write(&bad, b"fake").unwrap();

        let mut config = PipelineConfig::default();
        config.parallel.workers = 2;
        config.discovery = FileDiscoveryConfig { recursive: false, include: vec!["*.ppm".into()], exclude: vec![] };

        let result = run_batch(
            vec![dir.clone()],
            Arc::new(config),
            Arc::new(FixedLoader),
            stages(),
            Arc::new(NoPressureMonitor),
            ShutdownCoordinator::default().token(),
        )
        .await
        .unwrap();

        assert_eq!(result.stats.total, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.stats.processed, 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_input_directory_is_a_batch_fatal_error() {
        let config = Arc::new(PipelineConfig::default());
        let missing = PathBuf::from("/nonexistent/ocr-pipeline-batch-missing");
        let result = run_batch(
            vec![missing],
            config,
            Arc::new(FixedLoader),
            stages(),
            Arc::new(NoPressureMonitor),
            ShutdownCoordinator::default().token(),
        )
        .await;
        assert!(result.is_err());
    }
}
