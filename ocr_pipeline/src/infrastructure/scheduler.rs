// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Parallel Scheduler (§4.5)
//!
//! Standard fan-out/fan-in: a producer feeds a bounded jobs channel, `W`
//! worker tasks each acquire a [`WorkerBudget`] slot before running the
//! [`SingleImageExecutor`], and a single collector task reassembles results
//! in input order and drives the optional [`ProgressObserver`].
//!
//! Workers share one job receiver behind a `tokio::sync::Mutex` — this
//! crate carries no dedicated MPMC channel crate, and a mutex-guarded
//! `tokio::sync::mpsc::Receiver` is the standard way to fan one channel out
//! to several tokio tasks without one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ocr_pipeline_bootstrap::shutdown::CancellationToken;
use ocr_pipeline_domain::entities::{BatchStats, ImageJob, ImageResult};
use ocr_pipeline_domain::error::PipelineError;
use ocr_pipeline_domain::services::{NoopProgressObserver, ProgressObserver, ProgressSnapshot};
use ocr_pipeline_domain::value_objects::ParallelConfig;
use tokio::sync::{mpsc, Mutex};

use super::resource::WorkerBudget;
use super::stages::SingleImageExecutor;

/// What the scheduler hands back to the batch façade (§6 `BatchResult`
/// minus the `save`/`printStats` formatter hooks, which belong to
/// [`crate::presentation`]).
pub struct SchedulerOutcome {
    /// One slot per input image; `None` at an index means that image never
    /// completed (cancelled before being reached) or failed — failures are
    /// recorded in `errors` instead, keyed by `origin_hint`.
    pub results: Vec<Option<ImageResult>>,
    pub errors: HashMap<PathBuf, PipelineError>,
    pub stats: BatchStats,
    pub cancelled: bool,
}

struct WorkerMessage {
    index: usize,
    origin_hint: PathBuf,
    outcome: Result<ImageResult, PipelineError>,
}

/// Runs one batch of jobs to completion (or to cancellation).
///
/// `jobs` must already be ordered by `index` matching the caller's original
/// input list; the scheduler does not re-sort on the way in, only on the
/// way out. `total` is the size of that original list — it may exceed
/// `jobs.len()` when the façade already removed some entries (files that
/// failed to load before a job could even be built); `total` is what sizes
/// the `results` slot array so every `job.index` still lands in range.
pub async fn run_scheduler(
    jobs: Vec<ImageJob>,
    total: usize,
    executor: Arc<SingleImageExecutor>,
    budget: Arc<WorkerBudget>,
    config: &ParallelConfig,
    cancel: CancellationToken,
    progress: Option<Arc<dyn ProgressObserver>>,
) -> SchedulerOutcome {
    let job_count = jobs.len();
    let progress = progress.unwrap_or_else(|| Arc::new(NoopProgressObserver));
    let worker_count = budget.current().count().max(1);

    // §4.5 "N = len(images), chosen so the producer never blocks once jobs
    // are dispatched" when backpressure is off; when on, the channel's
    // capacity is the current worker count so a saturated pool is the rate
    // limit.
    let job_capacity = if config.backpressure { worker_count } else { job_count.max(1) };
    let (job_tx, job_rx) = mpsc::channel::<ImageJob>(job_capacity);
    let job_rx = Arc::new(Mutex::new(job_rx));

    let (result_tx, mut result_rx) = mpsc::channel::<WorkerMessage>(job_count.max(1));

    let producer = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            for job in jobs {
                tokio::select! {
                    send = job_tx.send(job) => {
                        if send.is_err() {
                            break;
                        }
                    }
                    _ = cancel.cancelled() => {
                        break;
                    }
                }
            }
            // Dropping `job_tx` here closes the channel so workers see `None`.
        })
    };

    let mut worker_handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let job_rx = Arc::clone(&job_rx);
        let result_tx = result_tx.clone();
        let executor = Arc::clone(&executor);
        let budget = Arc::clone(&budget);
        let cancel = cancel.clone();
        worker_handles.push(tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let job = {
                    let mut rx = job_rx.lock().await;
                    tokio::select! {
                        job = rx.recv() => job,
                        _ = cancel.cancelled() => None,
                    }
                };
                let Some(job) = job else { break };

                let permit = tokio::select! {
                    permit = budget.acquire() => permit,
                    _ = cancel.cancelled() => None,
                };
                let Some(permit) = permit else { break };

                let index = job.index;
                let origin_hint = job.origin_hint.clone();
                let outcome = executor.execute(job);
                drop(permit);

                if result_tx.send(WorkerMessage { index, origin_hint, outcome }).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(result_tx);

    let start = Instant::now();
    let mut results: Vec<Option<ImageResult>> = (0..total).map(|_| None).collect();
    let mut errors = HashMap::new();
    let mut processed = 0usize;
    let mut failed = 0usize;
    let progress_interval = Duration::from_millis(config.progress_interval_ms);
    let mut last_progress = Instant::now();

    progress.on_started(total).await;

    loop {
        tokio::select! {
            message = result_rx.recv() => {
                match message {
                    Some(WorkerMessage { index, origin_hint, outcome }) => {
                        match outcome {
                            Ok(result) => {
                                results[index] = Some(result);
                                processed += 1;
                                progress.on_image_completed(index).await;
                            }
                            Err(e) => {
                                errors.insert(origin_hint, e);
                                failed += 1;
                                progress.on_image_failed(index).await;
                            }
                        }
                    }
                    None => break,
                }
            }
            _ = cancel.cancelled() => {
                break;
            }
        }

        if last_progress.elapsed() >= progress_interval {
            progress
                .on_progress(ProgressSnapshot { started: total, completed: processed, failed, bytes_in: 0 })
                .await;
            last_progress = Instant::now();
        }
    }

    // Cancellation must not leak tasks: the producer has already observed
    // the token and workers exit their loop on the same check, but we still
    // join everything so no task outlives this function.
    let _ = producer.await;
    for handle in worker_handles {
        let _ = handle.await;
    }

    let final_snapshot = ProgressSnapshot { started: total, completed: processed, failed, bytes_in: 0 };
    progress.on_finished(final_snapshot).await;

    let stats = BatchStats::new(total, processed, failed, worker_count, start.elapsed());

    SchedulerOutcome { results, errors, stats, cancelled: cancel.is_cancelled() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_pipeline_bootstrap::shutdown::ShutdownCoordinator;
    use ocr_pipeline_domain::entities::DecodedImage;
    use ocr_pipeline_domain::services::{Capability, DetectEngine, Detection, RecogniseEngine, RecognisedText, RegionCrop};
    use ocr_pipeline_domain::value_objects::{BoundingBox, PipelineConfig, Polygon};
    use ocr_pipeline_domain::WorkerCount;

    use super::super::stages::StageSet;

    struct AlwaysOneRegion;
    impl DetectEngine for AlwaysOneRegion {
        fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
            Ok(vec![Detection { bbox: BoundingBox::new(0, 0, 4, 4), polygon: Polygon::new(vec![]), confidence: 0.8 }])
        }
    }

    struct EchoRecognise;
    impl RecogniseEngine for EchoRecognise {
        fn predict(&self, _region: &RegionCrop) -> Result<RecognisedText, PipelineError> {
            Ok(RecognisedText { text: "x".into(), confidence: 0.9, language: "en".into() })
        }
    }

    fn jobs(n: usize) -> Vec<ImageJob> {
        (0..n)
            .map(|i| ImageJob::new(i, DecodedImage::new(8, 8, vec![0u8; 8]), PathBuf::from(format!("{i}.png"))))
            .collect()
    }

    fn executor() -> Arc<SingleImageExecutor> {
        let stages = StageSet {
            orient: Capability::Absent,
            rectify: Capability::Absent,
            detect: Arc::new(AlwaysOneRegion),
            recognise: Arc::new(EchoRecognise),
        };
        Arc::new(SingleImageExecutor::new(stages, Arc::new(PipelineConfig::default())))
    }

    fn token() -> CancellationToken {
        ShutdownCoordinator::default().token()
    }

    #[tokio::test]
    async fn results_preserve_input_order() {
        let budget = Arc::new(WorkerBudget::new(WorkerCount::new(2), WorkerCount::new(1), WorkerCount::new(2), false));
        let outcome = run_scheduler(
            jobs(6),
            6,
            executor(),
            budget,
            &ParallelConfig { workers: 2, ..ParallelConfig::default() },
            token(),
            None,
        )
        .await;
        assert_eq!(outcome.results.len(), 6);
        assert!(outcome.results.iter().all(|r| r.is_some()));
        assert_eq!(outcome.stats.processed, 6);
        assert_eq!(outcome.stats.failed, 0);
    }

    #[tokio::test]
    async fn pre_cancelled_token_yields_no_processed_images() {
        let budget = Arc::new(WorkerBudget::new(WorkerCount::new(1), WorkerCount::new(1), WorkerCount::new(1), false));
        let cancel = token();
        cancel.cancel();
        let outcome = run_scheduler(
            jobs(4),
            4,
            executor(),
            budget,
            &ParallelConfig { workers: 1, ..ParallelConfig::default() },
            cancel,
            None,
        )
        .await;
        assert!(outcome.cancelled);
        assert_eq!(outcome.stats.processed, 0);
    }

    #[tokio::test]
    async fn total_can_exceed_dispatched_job_count() {
        // Simulates the façade dropping a file that failed to load before a
        // job was ever built: `jobs` only covers indices 0 and 2, but
        // `total` still reflects the full 3-file discovery list, so index 1
        // must remain `None` without panicking on an out-of-bounds write.
        let budget = Arc::new(WorkerBudget::new(WorkerCount::new(2), WorkerCount::new(1), WorkerCount::new(2), false));
        let sparse_jobs = vec![
            ImageJob::new(0, DecodedImage::new(8, 8, vec![0u8; 8]), PathBuf::from("0.png")),
            ImageJob::new(2, DecodedImage::new(8, 8, vec![0u8; 8]), PathBuf::from("2.png")),
        ];
        let outcome = run_scheduler(
            sparse_jobs,
            3,
            executor(),
            budget,
            &ParallelConfig { workers: 2, ..ParallelConfig::default() },
            token(),
            None,
        )
        .await;
        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results[0].is_some());
        assert!(outcome.results[1].is_none());
        assert!(outcome.results[2].is_some());
    }
}
