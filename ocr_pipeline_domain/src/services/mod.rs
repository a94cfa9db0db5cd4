// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain service *contracts*. Every concrete implementation lives in
//! `ocr_pipeline`'s infrastructure layer or in `ocr_pipeline_bootstrap`;
//! the domain crate only names the boundary.

pub mod capability;
pub mod engines;
pub mod image_loader;
pub mod multiscale_merge;
pub mod progress;
pub mod resource_monitor;

pub use capability::Capability;
pub use engines::{
    Detection, DetectEngine, OrientEngine, OrientOutput, RecogniseEngine, RecognisedText, RectifyEngine, RectifyOutput,
    RegionCrop,
};
pub use image_loader::ImageLoader;
pub use multiscale_merge::{merge_all, merge_incremental};
pub use progress::{NoopProgressObserver, ProgressObserver, ProgressSnapshot};
pub use resource_monitor::{Reading, ResourceMonitor};
