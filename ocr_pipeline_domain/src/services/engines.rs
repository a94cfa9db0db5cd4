// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Engine Contracts (§6)
//!
//! These are the "external collaborators" named in §1: concrete detection,
//! recognition, orientation, and rectification models are out of scope —
//! the core only depends on these four trait boundaries. Every method is
//! synchronous because the core treats engine calls as blocking (§5,
//! "Inference engines may release the execution thread internally; the
//! core treats them as blocking") and dispatches them from worker tasks
//! accordingly.
//!
//! # Thread safety
//!
//! Per §6, implementations must be safe for concurrent calls from many
//! threads with no mutable per-engine state leaking across calls. If an
//! engine's underlying runtime is not thread-safe, the *adaptor*
//! implementing these traits must wrap it in a per-engine mutex — never the
//! scheduler's concern (§9 "Shared engine handles").

use crate::entities::DecodedImage;
use crate::error::PipelineError;
use crate::value_objects::{BoundingBox, Polygon, Rotation};

/// Output of a single Orient call (§4.3.1).
#[derive(Debug, Clone)]
pub struct OrientOutput {
    pub rotated: DecodedImage,
    pub angle_degrees: i32,
    pub confidence: f32,
}

pub trait OrientEngine: Send + Sync {
    fn predict(&self, image: &DecodedImage) -> Result<OrientOutput, PipelineError>;

    /// The text-line orientation sub-mode (§4.3.1): decides 0°/180° flip for
    /// one detected region. `image` is the full post-Orient/Rectify image and
    /// `region_bbox` is that region's box within it — cropping pixel data is
    /// an out-of-scope geometry operation (§1), so the engine is responsible
    /// for extracting the sub-image itself from the two, the same contract
    /// `RecogniseEngine::predict` already has via `RegionCrop`. Given a
    /// default no-op implementation so engines that only support
    /// document-level orientation need not implement it.
    fn predict_textline(&self, _image: &DecodedImage, _region_bbox: &BoundingBox) -> Result<Rotation, PipelineError> {
        Ok(Rotation::None)
    }
}

/// Output of a single Rectify call (§4.3.2).
#[derive(Debug, Clone)]
pub struct RectifyOutput {
    pub warped: DecodedImage,
    pub mask_coverage: f32,
}

pub trait RectifyEngine: Send + Sync {
    fn predict(&self, image: &DecodedImage) -> Result<RectifyOutput, PipelineError>;
}

/// One raw detection before merge/threshold filtering (§4.3.3).
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub polygon: Polygon,
    pub confidence: f32,
}

pub trait DetectEngine: Send + Sync {
    fn predict(&self, image: &DecodedImage) -> Result<Vec<Detection>, PipelineError>;

    /// Batch form; the default simply calls `predict` per image. Engines
    /// that can genuinely vectorise across images may override this, but
    /// the scheduler never calls it across images itself (§9 "Cross-image
    /// micro-batching deliberately omitted") — it exists purely to satisfy
    /// the engine contract's symmetry with `RecogniseEngine::predict_batch`.
    fn predict_batch(&self, images: &[DecodedImage]) -> Result<Vec<Vec<Detection>>, PipelineError> {
        images.iter().map(|img| self.predict(img)).collect()
    }

    /// Runs detection at a given scale factor (§4.3.3 multi-scale option).
    /// Since resizing pixel data is an out-of-scope geometry operation
    /// (§1), the engine is responsible for any internal resampling and for
    /// mapping its output boxes/polygons back to the coordinates of the
    /// image it was actually given; the default simply ignores `scale` and
    /// predicts at the image's native resolution, which is the correct
    /// behaviour for `scale == 1.0` and for engines with no multi-scale
    /// support of their own.
    fn predict_at_scale(&self, image: &DecodedImage, scale: f32) -> Result<Vec<Detection>, PipelineError> {
        let _ = scale;
        self.predict(image)
    }
}

/// One region's recognition output (§4.3.4).
#[derive(Debug, Clone)]
pub struct RecognisedText {
    pub text: String,
    pub confidence: f32,
    pub language: String,
}

/// One cropped region handed to Recognise, already extracted from the
/// post-Orient/Rectify image by the executor using `bbox`/`polygon` from
/// Detect. The crop itself is an out-of-scope geometry operation (§1); in
/// practice an adaptor implementing this trait performs the crop using its
/// own image utilities before calling into the underlying model.
///
/// `text_line_rotation` carries the per-region decision the executor already
/// obtained from `OrientEngine::predict_textline` for this specific region
/// (§4.3.1 "Optional sub-mode"); the adaptor applies the flip as part of its
/// own crop step before decoding, since the core never touches pixel data.
#[derive(Debug, Clone)]
pub struct RegionCrop {
    pub image: DecodedImage,
    pub source_bbox: BoundingBox,
    pub source_polygon: Polygon,
    pub text_line_rotation: Rotation,
}

pub trait RecogniseEngine: Send + Sync {
    fn predict(&self, region: &RegionCrop) -> Result<RecognisedText, PipelineError>;

    /// Vectorised call over a micro-batch (§4.3.4 batching); order of
    /// outputs must match order of inputs (§6).
    fn predict_batch(&self, regions: &[RegionCrop]) -> Result<Vec<RecognisedText>, PipelineError> {
        regions.iter().map(|r| self.predict(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoDetect;
    impl DetectEngine for EchoDetect {
        fn predict(&self, _image: &DecodedImage) -> Result<Vec<Detection>, PipelineError> {
            Ok(vec![])
        }
    }

    #[test]
    fn default_predict_batch_preserves_order_and_length() {
        let engine = EchoDetect;
        let images = vec![DecodedImage::new(4, 4, vec![0u8; 4]), DecodedImage::new(8, 8, vec![0u8; 4])];
        let out = engine.predict_batch(&images).unwrap();
        assert_eq!(out.len(), 2);
    }
}
