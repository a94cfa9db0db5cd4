// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Stages (§4.3) and the Single-Image Executor (§4.4)
//!
//! Each stage is a pure function over `(image, config) → (output, elapsed,
//! error)`. The executor sequences `Orient? → Rectify? → Detect →
//! Recognise`, isolating per-image failures so one bad image never takes
//! down a batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ocr_pipeline_domain::entities::{DecodedImage, ImageJob, ImageResult, RegionResult, StageTimings};
use ocr_pipeline_domain::error::{PipelineError, StageName};
use ocr_pipeline_domain::services::{
    Capability, DetectEngine, OrientEngine, RecogniseEngine, RegionCrop, RectifyEngine,
};
use ocr_pipeline_domain::value_objects::{BoundingBox, PipelineConfig, Polygon, Rotation};

/// Output of the Orient stage (§4.3.1).
struct OrientResult {
    image: DecodedImage,
    rotation: Rotation,
    confidence: f32,
    elapsed: Duration,
}

/// Runs Orient, applying the "unrotated fallback" policy on an out-of-range
/// angle, a low-confidence prediction, or an engine error.
fn run_orient(engine: &dyn OrientEngine, image: &DecodedImage, threshold: f32) -> OrientResult {
    let start = Instant::now();
    let result = match engine.predict(image) {
        Ok(output) => match Rotation::from_degrees(output.angle_degrees) {
            Some(rotation) if output.confidence >= threshold => {
                OrientResult { image: output.rotated, rotation, confidence: output.confidence, elapsed: start.elapsed() }
            }
            _ => {
                tracing::debug!(
                    angle = output.angle_degrees,
                    confidence = output.confidence,
                    threshold,
                    "orient below threshold or unsupported angle, passing through unrotated"
                );
                OrientResult { image: image.clone(), rotation: Rotation::None, confidence: output.confidence, elapsed: start.elapsed() }
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "orient engine failed, passing through unrotated");
            OrientResult { image: image.clone(), rotation: Rotation::None, confidence: 0.0, elapsed: start.elapsed() }
        }
    };
    result
}

/// Output of the Rectify stage (§4.3.2).
struct RectifyResult {
    image: DecodedImage,
    elapsed: Duration,
}

fn run_rectify(engine: &dyn RectifyEngine, image: &DecodedImage, mask_threshold: f32) -> RectifyResult {
    let start = Instant::now();
    match engine.predict(image) {
        Ok(output) if output.mask_coverage >= mask_threshold => {
            RectifyResult { image: output.warped, elapsed: start.elapsed() }
        }
        Ok(output) => {
            tracing::debug!(mask_coverage = output.mask_coverage, mask_threshold, "rectify mask coverage below threshold, keeping original");
            RectifyResult { image: image.clone(), elapsed: start.elapsed() }
        }
        Err(e) => {
            tracing::debug!(error = %e, "rectify engine failed, keeping original");
            RectifyResult { image: image.clone(), elapsed: start.elapsed() }
        }
    }
}

/// Runs Detect, applying the multi-scale merge (§4.3.3) when enabled.
fn run_detect(
    engine: &dyn DetectEngine,
    image: &DecodedImage,
    config: &ocr_pipeline_domain::value_objects::DetectConfig,
) -> Result<(Vec<ocr_pipeline_domain::services::Detection>, Duration), PipelineError> {
    let start = Instant::now();
    let scales = config.multi_scale.effective_scales(image.min_side());

    let mut merged = Vec::new();
    for scale in scales {
        let at_scale = engine
            .predict_at_scale(image, scale)
            .map_err(|e| PipelineError::stage(StageName::Detect, e.to_string()))?;
        let filtered: Vec<_> = at_scale.into_iter().filter(|d| d.confidence >= config.db_box_thresh).collect();
        if config.multi_scale.enabled && config.multi_scale.incremental_merge {
            ocr_pipeline_domain::services::merge_incremental(&mut merged, filtered, config.multi_scale.merge_iou);
        } else {
            merged.extend(filtered);
        }
    }

    if config.multi_scale.enabled && !config.multi_scale.incremental_merge {
        // Single-pass merge: re-cluster everything gathered above at once.
        let regrouped = vec![merged];
        merged = ocr_pipeline_domain::services::merge_all(regrouped, config.multi_scale.merge_iou);
    }

    Ok((merged, start.elapsed()))
}

/// Which rotation, if any, the text-line orientation sub-mode decided for
/// one region (§4.3.1 "Optional sub-mode"). Pixel data is opaque to the
/// core (§1 "Image codec and geometry utilities" is an external
/// collaborator), so the executor cannot itself rotate the region crop;
/// instead it passes the region's own `bbox` alongside the full image so
/// the decision is specific to that region, and carries the decision on
/// the `RegionCrop` it hands to Recognise so the adaptor — which already
/// receives `source_bbox`/`source_polygon` and performs its own crop — can
/// apply the flip as part of that same step.
fn textline_rotation(engine: &dyn OrientEngine, image: &DecodedImage, region_bbox: &BoundingBox, enabled: bool) -> Rotation {
    if !enabled {
        return Rotation::None;
    }
    match engine.predict_textline(image, region_bbox) {
        Ok(rotation) => rotation,
        Err(e) => {
            tracing::debug!(error = %e, "textline orientation failed, assuming no rotation");
            Rotation::None
        }
    }
}

/// The stage engines and their resolved configs, tagged as present/absent
/// per §9 "Polymorphism of stages". Detect and Recognise are mandatory.
pub struct StageSet {
    pub orient: Capability<Arc<dyn OrientEngine>>,
    pub rectify: Capability<Arc<dyn RectifyEngine>>,
    pub detect: Arc<dyn DetectEngine>,
    pub recognise: Arc<dyn RecogniseEngine>,
}

/// Runs one image through the enabled stage sequence and builds an
/// `ImageResult` (§4.4).
pub struct SingleImageExecutor {
    stages: StageSet,
    config: Arc<PipelineConfig>,
}

impl SingleImageExecutor {
    pub fn new(stages: StageSet, config: Arc<PipelineConfig>) -> Self {
        Self { stages, config }
    }

    /// Executes the full stage sequence for one queued image.
    ///
    /// Cancellation is the caller's responsibility: the worker loop checks
    /// the cancellation token at the acquire/dispatch boundary (§4.5's
    /// "checked at every stage boundary" is honoured by the scheduler
    /// checking between jobs rather than mid-executor, since no single
    /// stage call here is interruptible once started).
    pub fn execute(&self, job: ImageJob) -> Result<ImageResult, PipelineError> {
        let original_width = job.image.width;
        let original_height = job.image.height;
        let mut timings = StageTimings::default();
        let overhead_start = Instant::now();

        let (post_orient_image, applied_rotation, orient_conf) = match self.stages.orient.as_ref() {
            Capability::Present(engine) if self.config.orient.enabled => {
                let result = run_orient(engine.as_ref(), &job.image, self.config.orient.threshold);
                timings.orient_ns = result.elapsed.as_nanos() as u64;
                (result.image, result.rotation, result.confidence)
            }
            _ => (job.image.clone(), Rotation::None, 0.0),
        };

        let post_rectify_image = match self.stages.rectify.as_ref() {
            Capability::Present(engine) if self.config.rectify.enabled => {
                let result = run_rectify(engine.as_ref(), &post_orient_image, self.config.rectify.mask_threshold);
                timings.rectify_ns = result.elapsed.as_nanos() as u64;
                result.image
            }
            _ => post_orient_image,
        };

        let (detections, detect_elapsed) = run_detect(self.stages.detect.as_ref(), &post_rectify_image, &self.config.detect)?;
        timings.detect_ns = detect_elapsed.as_nanos() as u64;

        let rotated_width = post_rectify_image.width;
        let rotated_height = post_rectify_image.height;

        if detections.is_empty() {
            let total_ns = timings.total_ns(overhead_start.elapsed().as_nanos() as u64);
            return Ok(ImageResult {
                width: original_width,
                height: original_height,
                regions: Vec::new(),
                avg_det_conf: 0.0,
                applied_rotation,
                orient_conf,
                timings,
                total_ns,
            });
        }

        let regions = self.run_recognise_and_assemble(
            &detections,
            &post_rectify_image,
            applied_rotation,
            rotated_width,
            rotated_height,
            original_width,
            original_height,
            &mut timings,
        )?;

        let avg_det_conf = ImageResult::average_detection_confidence(&regions);
        let total_ns = timings.total_ns(overhead_start.elapsed().as_nanos() as u64);

        let mut result = ImageResult {
            width: original_width,
            height: original_height,
            regions,
            avg_det_conf,
            applied_rotation,
            orient_conf,
            timings,
            total_ns,
        };
        for region in &mut result.regions {
            if region.clamp_confidences() {
                tracing::debug!("clamped out-of-range confidence for a region");
            }
        }
        Ok(result)
    }

    fn run_recognise_and_assemble(
        &self,
        detections: &[ocr_pipeline_domain::services::Detection],
        image: &DecodedImage,
        applied_rotation: Rotation,
        rotated_width: u32,
        rotated_height: u32,
        original_width: u32,
        original_height: u32,
        timings: &mut StageTimings,
    ) -> Result<Vec<RegionResult>, PipelineError> {
        let textline_enabled = self.config.orient.textline_enabled;
        let orient_engine = self.stages.orient.get();

        let crops: Vec<RegionCrop> = detections
            .iter()
            .map(|d| {
                let text_line_rotation = match orient_engine {
                    Some(engine) => textline_rotation(engine.as_ref(), image, &d.bbox, textline_enabled),
                    None => Rotation::None,
                };
                RegionCrop {
                    image: image.clone(),
                    source_bbox: d.bbox,
                    source_polygon: d.polygon.clone(),
                    text_line_rotation,
                }
            })
            .collect();

        let batch_size = self.config.recognise.batch_size;
        let start = Instant::now();
        let recognised = if batch_size == 0 {
            crops
                .iter()
                .map(|c| self.stages.recognise.predict(c))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PipelineError::stage(StageName::Recognise, e.to_string()))?
        } else {
            let mut out = Vec::with_capacity(crops.len());
            for chunk in crops.chunks(batch_size) {
                let mut batch_out = self
                    .stages
                    .recognise
                    .predict_batch(chunk)
                    .map_err(|e| PipelineError::stage(StageName::Recognise, e.to_string()))?;
                out.append(&mut batch_out);
            }
            out
        };
        timings.recognise_ns = start.elapsed().as_nanos() as u64;

        let min_conf = self.config.recognise.min_rec_confidence;
        let mut regions = Vec::with_capacity(detections.len());
        for (detection, text) in detections.iter().zip(recognised.into_iter()) {
            if text.confidence < min_conf {
                continue;
            }
            let original_polygon = detection.polygon.inverse_rotate(applied_rotation, rotated_width, rotated_height);
            let unclamped_bbox = original_polygon.bounding_box();
            let original_bbox = unclamped_bbox.clamp_to(original_width, original_height);
            if original_bbox != unclamped_bbox {
                tracing::debug!(
                    ?unclamped_bbox,
                    ?original_bbox,
                    "clamped out-of-range region box to image bounds"
                );
            }
            regions.push(RegionResult {
                bbox: original_bbox,
                polygon: original_polygon,
                det_conf: detection.confidence,
                text: text.text,
                rec_conf: text.confidence,
                language: text.language,
            });
        }
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_pipeline_domain::services::{Detection, OrientOutput, RectifyOutput, RecognisedText};
    use ocr_pipeline_domain::value_objects::{BoundingBox, DetectConfig, OrientConfig, Point, RectifyConfig};
    use std::path::PathBuf;

    struct NoopOrient;
    impl OrientEngine for NoopOrient {
        fn predict(&self, image: &DecodedImage) -> Result<OrientOutput, PipelineError> {
            Ok(OrientOutput { rotated: image.clone(), angle_degrees: 0, confidence: 0.99 })
        }
    }

    struct FailingOrient;
    impl OrientEngine for FailingOrient {
        fn predict(&self, _image: &DecodedImage) -> Result<OrientOutput, PipelineError> {
            Err(PipelineError::Internal("boom".into()))
        }
    }

    struct OneRegionDetect;
    impl DetectEngine for OneRegionDetect {
        fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
            Ok(vec![Detection {
                bbox: BoundingBox::new(0, 0, 10, 10),
                polygon: Polygon::new(vec![]),
                confidence: 0.9,
            }])
        }
    }

    struct ZeroRegionDetect;
    impl DetectEngine for ZeroRegionDetect {
        fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
            Ok(vec![])
        }
    }

    struct EchoRecognise;
    impl RecogniseEngine for EchoRecognise {
        fn predict(&self, _region: &RegionCrop) -> Result<RecognisedText, PipelineError> {
            Ok(RecognisedText { text: "hello".into(), confidence: 0.95, language: "en".into() })
        }
    }

    fn job() -> ImageJob {
        ImageJob::new(0, DecodedImage::new(320, 240, vec![0u8; 16]), PathBuf::from("test.png"))
    }

    fn stages_with(detect: Arc<dyn DetectEngine>) -> StageSet {
        StageSet {
            orient: Capability::Absent,
            rectify: Capability::Absent,
            detect,
            recognise: Arc::new(EchoRecognise),
        }
    }

    #[test]
    fn single_region_produces_one_recognised_region() {
        let config = Arc::new(PipelineConfig::default());
        let executor = SingleImageExecutor::new(stages_with(Arc::new(OneRegionDetect)), config);
        let result = executor.execute(job()).unwrap();
        assert_eq!(result.regions.len(), 1);
        assert_eq!(result.regions[0].text, "hello");
        assert_eq!(result.applied_rotation, Rotation::None);
    }

    #[test]
    fn zero_detections_skip_recognise_and_report_zero_confidence() {
        let config = Arc::new(PipelineConfig::default());
        let executor = SingleImageExecutor::new(stages_with(Arc::new(ZeroRegionDetect)), config);
        let result = executor.execute(job()).unwrap();
        assert!(result.regions.is_empty());
        assert_eq!(result.avg_det_conf, 0.0);
    }

    #[test]
    fn orient_engine_error_falls_back_to_unrotated_not_fatal() {
        let mut config = PipelineConfig::default();
        config.orient = OrientConfig { enabled: true, threshold: 0.7, ..OrientConfig::default() };
        let stages = StageSet {
            orient: Capability::Present(Arc::new(FailingOrient)),
            rectify: Capability::Absent,
            detect: Arc::new(OneRegionDetect),
            recognise: Arc::new(EchoRecognise),
        };
        let executor = SingleImageExecutor::new(stages, Arc::new(config));
        let result = executor.execute(job()).unwrap();
        assert_eq!(result.applied_rotation, Rotation::None);
    }

    #[test]
    fn recognise_results_below_min_confidence_are_discarded() {
        let mut config = PipelineConfig::default();
        config.recognise.min_rec_confidence = 0.99;
        let executor = SingleImageExecutor::new(stages_with(Arc::new(OneRegionDetect)), Arc::new(config));
        let result = executor.execute(job()).unwrap();
        assert!(result.regions.is_empty());
    }

    #[test]
    fn box_and_confidence_invariants_hold() {
        let config = Arc::new(PipelineConfig::default());
        let executor = SingleImageExecutor::new(stages_with(Arc::new(OneRegionDetect)), config);
        let result = executor.execute(job()).unwrap();
        assert!(result.all_confidences_in_range());
    }

    #[test]
    fn noop_orient_with_low_confidence_falls_back_unrotated() {
        struct LowConfOrient;
        impl OrientEngine for LowConfOrient {
            fn predict(&self, image: &DecodedImage) -> Result<OrientOutput, PipelineError> {
                Ok(OrientOutput { rotated: image.clone(), angle_degrees: 90, confidence: 0.1 })
            }
        }
        let mut config = PipelineConfig::default();
        config.orient = OrientConfig { enabled: true, threshold: 0.7, ..OrientConfig::default() };
        let stages = StageSet {
            orient: Capability::Present(Arc::new(LowConfOrient)),
            rectify: Capability::Absent,
            detect: Arc::new(ZeroRegionDetect),
            recognise: Arc::new(EchoRecognise),
        };
        let executor = SingleImageExecutor::new(stages, Arc::new(config));
        let result = executor.execute(job()).unwrap();
        assert_eq!(result.applied_rotation, Rotation::None);
    }

    #[test]
    fn rectify_below_mask_threshold_keeps_original() {
        struct LowCoverageRectify;
        impl RectifyEngine for LowCoverageRectify {
            fn predict(&self, image: &DecodedImage) -> Result<RectifyOutput, PipelineError> {
                Ok(RectifyOutput { warped: DecodedImage::new(1, 1, vec![0u8; 1]), mask_coverage: 0.1 })
            }
        }
        let mut config = PipelineConfig::default();
        config.rectify = RectifyConfig { enabled: true, mask_threshold: 0.5, ..RectifyConfig::default() };
        let stages = StageSet {
            orient: Capability::Absent,
            rectify: Capability::Present(Arc::new(LowCoverageRectify)),
            detect: Arc::new(OneRegionDetect),
            recognise: Arc::new(EchoRecognise),
        };
        let executor = SingleImageExecutor::new(stages, Arc::new(config));
        let result = executor.execute(job()).unwrap();
        // Original image was 320x240; if rectify had applied, detect would
        // have seen the 1x1 stand-in image instead.
        assert_eq!(result.width, 320);
        assert_eq!(result.height, 240);
    }

    #[test]
    fn multi_scale_detect_merges_overlapping_detections() {
        struct MultiScaleDetect;
        impl DetectEngine for MultiScaleDetect {
            fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
                unreachable!("predict_at_scale should be used when multi-scale is enabled")
            }
            fn predict_at_scale(&self, _image: &DecodedImage, scale: f32) -> Result<Vec<Detection>, PipelineError> {
                let confidence = if scale == 1.0 { 0.95 } else { 0.6 };
                Ok(vec![Detection { bbox: BoundingBox::new(0, 0, 10, 10), polygon: Polygon::new(vec![]), confidence }])
            }
        }
        let mut config = PipelineConfig::default();
        config.detect.multi_scale.enabled = true;
        config.detect.multi_scale.scales = vec![1.0, 0.5];
        config.detect.multi_scale.merge_iou = 0.1;
        let stages = StageSet {
            orient: Capability::Absent,
            rectify: Capability::Absent,
            detect: Arc::new(MultiScaleDetect),
            recognise: Arc::new(EchoRecognise),
        };
        let executor = SingleImageExecutor::new(stages, Arc::new(config));
        let result = executor.execute(job()).unwrap();
        assert_eq!(result.regions.len(), 1);
        assert!((result.regions[0].det_conf - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn textline_rotation_is_decided_per_region_not_shared_across_detections() {
        struct TwoRegionDetect;
        impl DetectEngine for TwoRegionDetect {
            fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
                Ok(vec![
                    Detection { bbox: BoundingBox::new(0, 0, 10, 10), polygon: Polygon::new(vec![]), confidence: 0.9 },
                    Detection { bbox: BoundingBox::new(50, 0, 10, 10), polygon: Polygon::new(vec![]), confidence: 0.9 },
                ])
            }
        }

        struct BboxSensitiveOrient;
        impl OrientEngine for BboxSensitiveOrient {
            fn predict(&self, image: &DecodedImage) -> Result<OrientOutput, PipelineError> {
                Ok(OrientOutput { rotated: image.clone(), angle_degrees: 0, confidence: 0.99 })
            }
            fn predict_textline(&self, _image: &DecodedImage, region_bbox: &BoundingBox) -> Result<Rotation, PipelineError> {
                Ok(if region_bbox.x == 0 { Rotation::Rotate180 } else { Rotation::None })
            }
        }

        struct EchoingRotationRecognise;
        impl RecogniseEngine for EchoingRotationRecognise {
            fn predict(&self, region: &RegionCrop) -> Result<RecognisedText, PipelineError> {
                Ok(RecognisedText { text: format!("{:?}", region.text_line_rotation), confidence: 0.9, language: "en".into() })
            }
        }

        let mut config = PipelineConfig::default();
        config.orient.textline_enabled = true;
        let stages = StageSet {
            orient: Capability::Present(Arc::new(BboxSensitiveOrient)),
            rectify: Capability::Absent,
            detect: Arc::new(TwoRegionDetect),
            recognise: Arc::new(EchoingRotationRecognise),
        };
        let executor = SingleImageExecutor::new(stages, Arc::new(config));
        let result = executor.execute(job()).unwrap();
        assert_eq!(result.regions.len(), 2);
        assert_ne!(result.regions[0].text, result.regions[1].text);
        assert_eq!(result.regions[0].text, "Rotate180");
        assert_eq!(result.regions[1].text, "None");
    }

    #[test]
    fn region_box_is_clamped_to_original_image_bounds() {
        struct OvershootingDetect;
        impl DetectEngine for OvershootingDetect {
            fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
                Ok(vec![Detection {
                    bbox: BoundingBox::new(0, 0, 10, 10),
                    polygon: Polygon::new(vec![
                        Point { x: 310.0, y: 3.0 },
                        Point { x: 400.0, y: 3.0 },
                        Point { x: 400.0, y: 300.0 },
                        Point { x: 310.0, y: 300.0 },
                    ]),
                    confidence: 0.9,
                }])
            }
        }

        // `job()` decodes a 320x240 image; the polygon above extends to
        // x=400/y=300, well past both edges.
        let config = Arc::new(PipelineConfig::default());
        let executor = SingleImageExecutor::new(stages_with(Arc::new(OvershootingDetect)), config);
        let result = executor.execute(job()).unwrap();
        assert_eq!(result.regions.len(), 1);
        let bbox = result.regions[0].bbox;
        assert!(bbox.x + bbox.w <= 320);
        assert!(bbox.y + bbox.h <= 240);
    }
}
