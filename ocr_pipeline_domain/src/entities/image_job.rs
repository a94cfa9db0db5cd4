// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! One queued image (§3 `ImageJob`): created by the scheduler's producer on
//! enqueue, destroyed on dequeue by the worker that picks it up.

use std::path::PathBuf;

use super::image::DecodedImage;

#[derive(Debug, Clone)]
pub struct ImageJob {
    /// Position in the original input list; carried through to the result
    /// so the collector can rebuild input order (§4.5 "Ordering").
    pub index: usize,
    pub image: DecodedImage,
    /// The path or other origin the image was loaded from, kept for error
    /// reporting (`BatchResult.errors[path]`, §4.6).
    pub origin_hint: PathBuf,
}

impl ImageJob {
    pub fn new(index: usize, image: DecodedImage, origin_hint: impl Into<PathBuf>) -> Self {
        Self { index, image, origin_hint: origin_hint.into() }
    }
}
