// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Immutable value objects shared across the OCR execution core.

pub mod config;
pub mod geometry;
pub mod memory_size;
pub mod worker_count;

pub use config::{
    DetectConfig, FileDiscoveryConfig, MultiScaleConfig, OrientConfig, ParallelConfig, PipelineConfig, PolygonMode,
    RecogniseConfig, RectifyConfig,
};
pub use geometry::{BoundingBox, Point, Polygon, Rotation};
pub use memory_size::MemorySize;
pub use worker_count::WorkerCount;
