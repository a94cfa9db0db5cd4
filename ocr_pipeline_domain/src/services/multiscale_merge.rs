// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Multi-Scale Detection Merge (§4.3.3)
//!
//! Detect may run at several scales and map every polygon back to the
//! original image's coordinate system before the results reach this module;
//! merging only ever compares boxes already expressed in one common frame.
//! Overlapping detections (IoU ≥ `merge_iou`) collapse to their
//! highest-confidence representative, applied incrementally after each scale
//! so the working set never holds more than one scale's raw output plus the
//! running merged set (§4.3.3 "incremental merging is applied after each
//! scale to bound memory").

use rayon::prelude::*;

use super::engines::Detection;

/// Merges `incoming` into `accumulated`, keeping the highest-confidence
/// detection for every cluster of mutually overlapping boxes (IoU ≥
/// `iou_threshold`). `accumulated` already holds the merged result of every
/// previously processed scale; this is the "incremental merge" step called
/// once per scale level rather than once at the end.
///
/// IoU pairs against the (typically small, tens-of-regions) accumulated set
/// are computed in parallel via rayon — the dependency this crate declares
/// `rayon` for (§4.3.3).
pub fn merge_incremental(accumulated: &mut Vec<Detection>, incoming: Vec<Detection>, iou_threshold: f32) {
    for det in incoming {
        let overlap_index = accumulated
            .par_iter()
            .position_any(|existing| existing.bbox.iou(&det.bbox) >= iou_threshold);

        match overlap_index {
            Some(idx) if accumulated[idx].confidence >= det.confidence => {
                // existing representative already has the higher confidence, drop `det`
            }
            Some(idx) => accumulated[idx] = det,
            None => accumulated.push(det),
        }
    }
}

/// Merges a full batch of scale-level detections in one pass (used when a
/// caller has already gathered every scale and `incrementalMerge` is
/// disabled). Equivalent to folding [`merge_incremental`] over each scale's
/// output in order.
pub fn merge_all(scales: Vec<Vec<Detection>>, iou_threshold: f32) -> Vec<Detection> {
    let mut merged = Vec::new();
    for scale_detections in scales {
        merge_incremental(&mut merged, scale_detections, iou_threshold);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{BoundingBox, Polygon};

    fn det(x: u32, y: u32, w: u32, h: u32, confidence: f32) -> Detection {
        Detection { bbox: BoundingBox::new(x, y, w, h), polygon: Polygon::new(vec![]), confidence }
    }

    #[test]
    fn disjoint_detections_are_all_kept() {
        let mut acc = vec![det(0, 0, 10, 10, 0.9)];
        merge_incremental(&mut acc, vec![det(100, 100, 10, 10, 0.8)], 0.3);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn overlapping_detection_keeps_higher_confidence() {
        let mut acc = vec![det(0, 0, 10, 10, 0.5)];
        merge_incremental(&mut acc, vec![det(1, 1, 10, 10, 0.9)], 0.1);
        assert_eq!(acc.len(), 1);
        assert!((acc[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn overlapping_lower_confidence_does_not_replace_existing() {
        let mut acc = vec![det(0, 0, 10, 10, 0.9)];
        merge_incremental(&mut acc, vec![det(1, 1, 10, 10, 0.5)], 0.1);
        assert_eq!(acc.len(), 1);
        assert!((acc[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn merge_all_folds_scales_in_order() {
        let scales =
            vec![vec![det(0, 0, 10, 10, 0.6)], vec![det(0, 0, 10, 10, 0.95)], vec![det(200, 200, 5, 5, 0.4)]];
        let merged = merge_all(scales, 0.3);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|d| (d.confidence - 0.95).abs() < f32::EPSILON));
    }
}
