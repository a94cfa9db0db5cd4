// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The full per-image result record (§3 `ImageResult`) and its timing
//! breakdown, produced once by the Single-Image Executor and immutable
//! thereafter.

use serde::{Deserialize, Serialize};

use super::region_result::RegionResult;
use crate::value_objects::Rotation;

/// Per-stage wall-clock timings, in nanoseconds (§4.3 "Stage timing").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub orient_ns: u64,
    pub rectify_ns: u64,
    pub detect_ns: u64,
    pub recognise_ns: u64,
}

impl StageTimings {
    /// The total timing is the sum of stage timings plus executor overhead
    /// (§4.3); `overhead_ns` captures everything the executor itself spends
    /// outside of a stage call (coordinate transforms, result assembly).
    pub fn total_ns(&self, overhead_ns: u64) -> u64 {
        self.orient_ns + self.rectify_ns + self.detect_ns + self.recognise_ns + overhead_ns
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub width: u32,
    pub height: u32,
    pub regions: Vec<RegionResult>,
    pub avg_det_conf: f32,
    pub applied_rotation: Rotation,
    pub orient_conf: f32,
    pub timings: StageTimings,
    pub total_ns: u64,
}

impl ImageResult {
    /// `avgDetConf = mean(regions[].detConf)` when non-empty, else 0 (§3).
    pub fn average_detection_confidence(regions: &[RegionResult]) -> f32 {
        if regions.is_empty() {
            return 0.0;
        }
        let sum: f32 = regions.iter().map(|r| r.det_conf).sum();
        sum / regions.len() as f32
    }

    /// §8.5 "box validity": every region's box is contained within the
    /// result's own `width`/`height`.
    pub fn all_boxes_within_bounds(&self) -> bool {
        self.regions.iter().all(|r| r.bbox.is_within(self.width, self.height))
    }

    /// §8.6 "confidence bounds".
    pub fn all_confidences_in_range(&self) -> bool {
        self.regions.iter().all(|r| (0.0..=1.0).contains(&r.det_conf) && (0.0..=1.0).contains(&r.rec_conf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{BoundingBox, Polygon};

    fn region(det_conf: f32) -> RegionResult {
        RegionResult {
            bbox: BoundingBox::new(0, 0, 1, 1),
            polygon: Polygon::new(vec![]),
            det_conf,
            text: String::new(),
            rec_conf: 0.5,
            language: "en".into(),
        }
    }

    #[test]
    fn average_of_empty_regions_is_zero() {
        assert_eq!(ImageResult::average_detection_confidence(&[]), 0.0);
    }

    #[test]
    fn average_of_regions_is_arithmetic_mean() {
        let regions = vec![region(0.8), region(0.4)];
        assert!((ImageResult::average_detection_confidence(&regions) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn total_ns_sums_stage_timings_plus_overhead() {
        let t = StageTimings { orient_ns: 1, rectify_ns: 2, detect_ns: 3, recognise_ns: 4 };
        assert_eq!(t.total_ns(10), 20);
    }
}
