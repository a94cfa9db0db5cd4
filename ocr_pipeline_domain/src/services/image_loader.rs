// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Loader Contract (§1 "Image codec and geometry utilities")
//!
//! Decoding an image file into a [`DecodedImage`] is an out-of-scope
//! external collaborator, same as the four inference engines (§6): the
//! core only depends on this one trait boundary. The Batch Façade (§4.6)
//! calls it once per discovered path before handing the result to the
//! scheduler as an `ImageJob`.

use std::path::Path;

use crate::entities::DecodedImage;
use crate::error::PipelineError;

/// Decodes one file into the core's opaque image representation.
///
/// Implementations report an unsupported extension or a malformed file as
/// `PipelineError::Io` — per §4.6, "unsupported or unreadable images
/// produce a per-file error that is aggregated ... never panicking the
/// batch."
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<DecodedImage, PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLoader;
    impl ImageLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<DecodedImage, PipelineError> {
            Ok(DecodedImage::new(4, 4, vec![0u8; 4]))
        }
    }

    #[test]
    fn loader_returns_a_decoded_image() {
        let loader = FixedLoader;
        let image = loader.load(Path::new("anything.ppm")).unwrap();
        assert_eq!(image.width, 4);
    }
}
