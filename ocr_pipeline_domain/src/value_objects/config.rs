// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Configuration
//!
//! `PipelineConfig` is the fully-resolved, immutable configuration record
//! described in §6: one nested record per stage plus the parallelism and
//! resource-policy options. It is built once by the application layer
//! (file + env + CLI precedence, §10.4) and then shared read-only across
//! every worker for the duration of one batch (§3 "Ownership").

use serde::{Deserialize, Serialize};

use super::memory_size::MemorySize;
use super::worker_count::WorkerCount;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonMode {
    MinRect,
    Contour,
}

impl Default for PolygonMode {
    fn default() -> Self {
        PolygonMode::MinRect
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiScaleConfig {
    pub enabled: bool,
    pub scales: Vec<f32>,
    pub merge_iou: f32,
    pub adaptive: bool,
    pub max_levels: u32,
    pub min_side: u32,
    pub incremental_merge: bool,
}

impl Default for MultiScaleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scales: vec![1.0, 0.75, 0.5],
            merge_iou: 0.3,
            adaptive: false,
            max_levels: 3,
            min_side: 320,
            incremental_merge: true,
        }
    }
}

impl MultiScaleConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.enabled && self.scales.is_empty() {
            return Err(PipelineError::Config("multiScale.scales must be non-empty when enabled".into()));
        }
        if self.scales.iter().any(|s| *s <= 0.0) {
            return Err(PipelineError::Config("multiScale.scales must be strictly positive".into()));
        }
        if !(0.0..=1.0).contains(&self.merge_iou) {
            return Err(PipelineError::Config("multiScale.mergeIoU must be in [0, 1]".into()));
        }
        Ok(())
    }

    /// Derives the scale pyramid to actually run, honouring adaptive mode:
    /// stop once `min_side * scale <= min_side_floor`, capped at `max_levels`.
    pub fn effective_scales(&self, image_min_side: u32) -> Vec<f32> {
        if !self.enabled {
            return vec![1.0];
        }
        if !self.adaptive {
            return self.scales.clone();
        }
        let mut out = Vec::new();
        let mut scale = 1.0f32;
        for _ in 0..self.max_levels {
            if (image_min_side as f32 * scale) <= self.min_side as f32 {
                break;
            }
            out.push(scale);
            scale *= 0.75;
        }
        if out.is_empty() {
            out.push(1.0);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientConfig {
    pub enabled: bool,
    pub threshold: f32,
    pub textline_enabled: bool,
    pub textline_threshold: f32,
}

impl Default for OrientConfig {
    fn default() -> Self {
        Self { enabled: false, threshold: 0.7, textline_enabled: false, textline_threshold: 0.6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    pub enabled: bool,
    pub mask_threshold: f32,
    pub output_height: u32,
    pub debug_dir: Option<String>,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self { enabled: false, mask_threshold: 0.5, output_height: 1024, debug_dir: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    pub db_thresh: f32,
    pub db_box_thresh: f32,
    pub polygon_mode: PolygonMode,
    pub multi_scale: MultiScaleConfig,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self { db_thresh: 0.3, db_box_thresh: 0.5, polygon_mode: PolygonMode::default(), multi_scale: MultiScaleConfig::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecogniseConfig {
    pub batch_size: usize,
    pub pad_width_multiple: u32,
    pub image_height: u32,
    pub max_width: u32,
    pub min_rec_confidence: f32,
}

impl Default for RecogniseConfig {
    fn default() -> Self {
        Self { batch_size: 0, pad_width_multiple: 32, image_height: 48, max_width: 960, min_rec_confidence: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    pub workers: usize,
    pub memory_threshold: f32,
    pub adaptive_scaling: bool,
    pub backpressure: bool,
    pub progress_interval_ms: u64,
    pub show_progress: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: WorkerCount::default_for_system().count(),
            memory_threshold: 0.8,
            adaptive_scaling: false,
            backpressure: true,
            progress_interval_ms: 500,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiscoveryConfig {
    pub recursive: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FileDiscoveryConfig {
    fn default() -> Self {
        Self { recursive: false, include: vec!["*".to_string()], exclude: Vec::new() }
    }
}

/// The fully-resolved, immutable configuration for one batch run (§3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub parallel: ParallelConfig,
    pub memory_limit: MemorySize,
    pub orient: OrientConfig,
    pub rectify: RectifyConfig,
    pub detect: DetectConfig,
    pub recognise: RecogniseConfig,
    pub discovery: FileDiscoveryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: ParallelConfig::default(),
            memory_limit: MemorySize::ZERO,
            orient: OrientConfig::default(),
            rectify: RectifyConfig::default(),
            detect: DetectConfig::default(),
            recognise: RecogniseConfig::default(),
            discovery: FileDiscoveryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Eager, one-shot validation applied before any worker starts (§7
    /// "Batch-level errors halt the batch before any workers are started").
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.parallel.workers == 0 {
            return Err(PipelineError::Config("workers must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.parallel.memory_threshold) {
            return Err(PipelineError::Config("memoryThreshold must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.orient.threshold) {
            return Err(PipelineError::Config("orientationThreshold must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.rectify.mask_threshold) {
            return Err(PipelineError::Config("maskThreshold must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.detect.db_box_thresh) {
            return Err(PipelineError::Config("dbBoxThresh must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.recognise.min_rec_confidence) {
            return Err(PipelineError::Config("minRecConfidence must be in [0, 1]".into()));
        }
        self.detect.multi_scale.validate()?;
        if self.discovery.include.is_empty() {
            return Err(PipelineError::Config("discovery.include must contain at least one pattern".into()));
        }
        Ok(())
    }

    /// Low-water mark of the Worker Budget ticker's pressure check (§4.2:
    /// `lowMark = threshold - 0.1`).
    pub fn low_pressure_mark(&self) -> f32 {
        (self.parallel.memory_threshold - 0.1).max(0.0)
    }
}
