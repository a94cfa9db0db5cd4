// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! One detected-and-recognised text region (§3 `RegionResult`).

use serde::{Deserialize, Serialize};

use crate::value_objects::{BoundingBox, Polygon};

/// Created by the executor once Detect (and optionally Recognise) has run
/// for this region; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResult {
    pub bbox: BoundingBox,
    pub polygon: Polygon,
    pub det_conf: f32,
    pub text: String,
    pub rec_conf: f32,
    pub language: String,
}

impl RegionResult {
    /// Clamps confidences into `[0, 1]`, per §4.4's "out-of-range
    /// confidences are clamped and logged" — called by the executor, never
    /// silently by a stage, so the clamp is visible at a single call site.
    pub fn clamp_confidences(&mut self) -> bool {
        let mut clamped = false;
        if !(0.0..=1.0).contains(&self.det_conf) {
            self.det_conf = self.det_conf.clamp(0.0, 1.0);
            clamped = true;
        }
        if !(0.0..=1.0).contains(&self.rec_conf) {
            self.rec_conf = self.rec_conf.clamp(0.0, 1.0);
            clamped = true;
        }
        clamped
    }
}
