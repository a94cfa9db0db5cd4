// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Decoded Image
//!
//! `DecodedImage` is the core's only image representation. Loading,
//! decoding, rotating, cropping, and warping pixels are all out of scope
//! (§1: "Image codec and geometry utilities") and live behind the engine
//! traits in [`crate::services::engines`] — the core only ever holds a
//! decoded image's dimensions and an opaque pixel buffer it hands to
//! engines and never inspects itself.

use std::sync::Arc;

/// An opaque, already-decoded image. `data` is whatever byte layout the
/// injected engines agree on (raw RGB planes, a pre-encoded tensor, etc.);
/// the core never interprets it, only measures and moves it.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    data: Arc<[u8]>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self { width, height, data: data.into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_side_picks_the_smaller_dimension() {
        let img = DecodedImage::new(1920, 1080, vec![0u8; 4]);
        assert_eq!(img.min_side(), 1080);
    }

    #[test]
    fn clone_shares_the_underlying_buffer() {
        let img = DecodedImage::new(4, 4, vec![1, 2, 3, 4]);
        let clone = img.clone();
        assert_eq!(img.data(), clone.data());
    }
}
