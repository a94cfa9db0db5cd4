// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # OCR Pipeline — Execution Core
//!
//! The parallel OCR execution core: the resource/worker-budget runtime, the
//! four stage adaptors (Orient, Rectify, Detect, Recognise), the
//! single-image executor, the fan-out/fan-in parallel scheduler, and the
//! batch façade that ties them together for the demonstration CLI binary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              APPLICATION (batch)            │
//! │  - File discovery                           │
//! │  - Image loading                            │
//! │  - Batch façade / BatchResult assembly       │
//! └─────────────────┬─────────────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │         INFRASTRUCTURE (runtime)             │
//! │  - Resource monitor + worker budget          │
//! │  - Stage adaptors + single-image executor    │
//! │  - Parallel scheduler                        │
//! │  - Logging / metrics / progress              │
//! └─────────────────┬─────────────────────────────┘
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │         ocr_pipeline_domain (pure)           │
//! │  - Entities, value objects, error taxonomy   │
//! │  - Service contracts (traits only)           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! This crate depends on [`ocr_pipeline_domain`] for every type named above
//! and on [`ocr_pipeline_bootstrap`] for platform memory sampling and the
//! shutdown cancellation token threaded through the scheduler.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use ocr_pipeline_domain::{
    BatchStats, BoundingBox, DecodedImage, DetectConfig, FileDiscoveryConfig, ImageJob, ImageResult, MemorySize,
    MultiScaleConfig, OrientConfig, ParallelConfig, PipelineConfig, PipelineError, Point, Polygon, PolygonMode,
    RecogniseConfig, RectifyConfig, RegionResult, Rotation, StageName, StageTimings, WorkerCount,
};

pub use application::batch::{run_batch, BatchResult};
