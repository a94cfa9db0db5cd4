// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # OCR Pipeline Domain
//!
//! Pure, reusable business logic for the parallel OCR execution core:
//! entities, value objects, the error taxonomy, and the service contracts
//! (`ResourceMonitor`, the four inference engine traits, `ProgressObserver`)
//! that the rest of the workspace implements against.
//!
//! This crate follows the same layering discipline as the rest of the
//! workspace: no `tokio` runtime, no `tracing`, no `anyhow` — domain code
//! is synchronous and returns `Result<T, PipelineError>` exclusively.
//! `async-trait` is the one exception, used only for [`services::ProgressObserver`],
//! whose implementations are invoked across the scheduler's channel boundary.
//!
//! ## Layout
//!
//! - [`entities`] — `ImageJob`, `DecodedImage`, `RegionResult`, `ImageResult`, `BatchStats`.
//! - [`value_objects`] — `WorkerCount`, `MemorySize`, `BoundingBox`/`Polygon`/`Rotation`, `PipelineConfig` and its nested stage configs.
//! - [`services`] — the inference engine contracts (§6), `ResourceMonitor`, `ProgressObserver`, and the `Capability` tagged-variant used for optional stages.
//! - [`error`] — `PipelineError`, the taxonomy shared by every layer.

pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

pub use entities::{BatchStats, DecodedImage, ImageJob, ImageResult, RegionResult, StageTimings};
pub use error::{PipelineError, StageName};
pub use value_objects::{
    BoundingBox, DetectConfig, FileDiscoveryConfig, MemorySize, MultiScaleConfig, OrientConfig, ParallelConfig,
    PipelineConfig, Point, Polygon, PolygonMode, RecogniseConfig, RectifyConfig, Rotation, WorkerCount,
};
