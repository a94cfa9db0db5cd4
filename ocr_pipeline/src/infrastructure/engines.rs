// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Model Resolution and Demonstration Engines
//!
//! §1 names "Model file resolution" (returning absolute paths for named
//! model variants) and the four inference engines themselves as external
//! collaborators: the core never ships a neural-network runtime. This
//! module provides [`ModelResolver`], the one small piece of that
//! boundary the core can usefully own (locating a model file on disk), and
//! a set of deterministic stand-in engines used by the demonstration
//! binary and the scheduler's integration tests in place of a real
//! inference runtime.

use std::path::PathBuf;

use ocr_pipeline_domain::entities::DecodedImage;
use ocr_pipeline_domain::error::PipelineError;
use ocr_pipeline_domain::services::{
    Detection, DetectEngine, OrientEngine, OrientOutput, RecogniseEngine, RecognisedText, RectifyEngine, RectifyOutput,
    RegionCrop,
};
use ocr_pipeline_domain::value_objects::{BoundingBox, Point, Polygon, Rotation};

/// Resolves a named model variant (e.g. `"detect-mobile"`, `"recognise-en"`)
/// to an absolute file path under a configured models directory (§1
/// "Model file resolution"). The core never opens or interprets the file
/// itself — resolution is purely a path lookup the engine adaptors use
/// during their own construction.
pub struct ModelResolver {
    models_dir: PathBuf,
}

impl ModelResolver {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self { models_dir: models_dir.into() }
    }

    /// Returns the absolute path for `variant`, trying each of
    /// `extensions` in order (most specific first). Errors with
    /// `PipelineError::Resolve` — a batch-fatal error per §7 — when none
    /// exist, since a missing model means the batch cannot start at all.
    pub fn resolve(&self, variant: &str, extensions: &[&str]) -> Result<PathBuf, PipelineError> {
        for ext in extensions {
            let candidate = self.models_dir.join(format!("{variant}.{ext}"));
            if candidate.is_file() {
                return candidate
                    .canonicalize()
                    .map_err(|e| PipelineError::Resolve(format!("{}: {e}", candidate.display())));
            }
        }
        Err(PipelineError::Resolve(format!(
            "no model file for variant '{variant}' under {} (tried extensions {extensions:?})",
            self.models_dir.display()
        )))
    }
}

/// Treats the whole image as one region — a placeholder standing in for a
/// real detection network so the scheduler, executor, and micro-batching
/// path can be exercised end to end without one (§1 "the accuracy of any
/// model" is explicitly a non-goal of this core).
pub struct WholeImageDetectEngine {
    pub confidence: f32,
}

impl Default for WholeImageDetectEngine {
    fn default() -> Self {
        Self { confidence: 0.99 }
    }
}

impl DetectEngine for WholeImageDetectEngine {
    fn predict(&self, image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
        let bbox = BoundingBox::new(0, 0, image.width, image.height);
        let polygon = Polygon::new(vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: image.width as f32, y: 0.0 },
            Point { x: image.width as f32, y: image.height as f32 },
            Point { x: 0.0, y: image.height as f32 },
        ]);
        Ok(vec![Detection { bbox, polygon, confidence: self.confidence }])
    }
}

/// Reports a fixed, empty transcription for every region — a placeholder
/// standing in for a real recognition network.
pub struct NullRecogniseEngine {
    pub confidence: f32,
}

impl Default for NullRecogniseEngine {
    fn default() -> Self {
        Self { confidence: 1.0 }
    }
}

impl RecogniseEngine for NullRecogniseEngine {
    fn predict(&self, _region: &RegionCrop) -> Result<RecognisedText, PipelineError> {
        Ok(RecognisedText { text: String::new(), confidence: self.confidence, language: "und".to_string() })
    }
}

/// Always reports no rotation — a placeholder for a real document
/// orientation network.
pub struct IdentityOrientEngine;

impl OrientEngine for IdentityOrientEngine {
    fn predict(&self, image: &DecodedImage) -> Result<OrientOutput, PipelineError> {
        Ok(OrientOutput { rotated: image.clone(), angle_degrees: 0, confidence: 1.0 })
    }
}

/// Always returns the input unwarped — a placeholder for a real
/// rectification network.
pub struct IdentityRectifyEngine;

impl RectifyEngine for IdentityRectifyEngine {
    fn predict(&self, image: &DecodedImage) -> Result<RectifyOutput, PipelineError> {
        Ok(RectifyOutput { warped: image.clone(), mask_coverage: 1.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolver_errors_when_no_variant_file_exists() {
        let resolver = ModelResolver::new(std::env::temp_dir());
        let err = resolver.resolve("nonexistent-variant-xyz", &["onnx"]).unwrap_err();
        assert!(matches!(err, PipelineError::Resolve(_)));
    }

    #[test]
    fn resolver_finds_an_existing_model_file() {
        let dir = std::env::temp_dir().join(format!("ocr-pipeline-models-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let model_path = dir.join("detect-mobile.onnx");
        fs::write(&model_path, b"fake model bytes").unwrap();

        let resolver = ModelResolver::new(&dir);
        let resolved = resolver.resolve("detect-mobile", &["onnx"]).unwrap();
        assert!(resolved.ends_with("detect-mobile.onnx"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn whole_image_detect_returns_one_full_frame_region() {
        let engine = WholeImageDetectEngine::default();
        let image = DecodedImage::new(100, 50, vec![0u8; 4]);
        let detections = engine.predict(&image).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox, BoundingBox::new(0, 0, 100, 50));
    }

    #[test]
    fn null_recognise_reports_empty_text() {
        let engine = NullRecogniseEngine::default();
        let region = RegionCrop {
            image: DecodedImage::new(10, 10, vec![0u8; 4]),
            source_bbox: BoundingBox::new(0, 0, 10, 10),
            source_polygon: Polygon::new(vec![]),
            text_line_rotation: Rotation::None,
        };
        let result = engine.predict(&region).unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.confidence, 1.0);
    }
}
