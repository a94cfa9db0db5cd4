// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Loader (§1 "Image codec and geometry utilities")
//!
//! A minimal, dependency-free decoder for the binary Netpbm formats (PGM
//! grayscale, PPM RGB). Real deployments inject a collaborator backed by a
//! proper codec library; per §1 that collaborator is out of scope for this
//! core, and Netpbm's trivial plain-text header plus raw sample bytes is
//! enough to exercise the full pipeline end to end in the demonstration
//! binary and in tests without adding an image-decoding dependency this
//! crate otherwise has no use for.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ocr_pipeline_domain::entities::DecodedImage;
use ocr_pipeline_domain::error::PipelineError;
use ocr_pipeline_domain::services::ImageLoader;

const SUPPORTED_EXTENSIONS: &[&str] = &["pgm", "ppm"];

/// Loads PGM/PPM files from disk (§4.6 "Unsupported or unreadable images
/// produce a per-file error").
pub struct NetpbmImageLoader;

impl ImageLoader for NetpbmImageLoader {
    fn load(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| PipelineError::Io(format!("{}: no file extension", path.display())))?;

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(PipelineError::Io(format!("{}: unsupported image format '{extension}'", path.display())));
        }

        let bytes = fs::read(path).map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))?;
        decode_netpbm(&bytes, &extension).map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))
    }
}

/// Channels per pixel for each supported magic number: P5 (PGM, grayscale)
/// is 1, P6 (PPM, RGB) is 3. The decoder stores raw interleaved samples;
/// the core treats the buffer as opaque (§3 `DecodedImage`) so it never
/// inspects the channel count itself.
fn decode_netpbm(bytes: &[u8], extension: &str) -> Result<DecodedImage, String> {
    let mut cursor = NetpbmCursor::new(bytes);
    let magic = cursor.token()?;
    let expected_magic = match extension {
        "pgm" => "P5",
        "ppm" => "P6",
        _ => unreachable!("checked by caller"),
    };
    if magic != expected_magic {
        return Err(format!("expected magic number '{expected_magic}', found '{magic}'"));
    }

    let width: u32 = cursor.token()?.parse().map_err(|_| "invalid width".to_string())?;
    let height: u32 = cursor.token()?.parse().map_err(|_| "invalid height".to_string())?;
    let maxval: u32 = cursor.token()?.parse().map_err(|_| "invalid maxval".to_string())?;
    if maxval == 0 || maxval > 255 {
        return Err(format!("unsupported maxval {maxval} (only 8-bit samples are supported)"));
    }

    let channels = if extension == "ppm" { 3 } else { 1 };
    let expected_len = width as usize * height as usize * channels;
    let data = cursor.remaining_after_single_whitespace();
    if data.len() < expected_len {
        return Err(format!("truncated pixel data: expected {expected_len} bytes, found {}", data.len()));
    }

    Ok(DecodedImage::new(width, height, Arc::from(&data[..expected_len])))
}

/// Tokenizes a Netpbm header: whitespace-separated ASCII fields, with `#`
/// introducing a comment that runs to end of line.
struct NetpbmCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> NetpbmCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos < self.bytes.len() && self.bytes[self.pos] == b'#' {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn token(&mut self) -> Result<String, String> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err("unexpected end of header".to_string());
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    /// Netpbm requires exactly one whitespace byte between the header's
    /// last token and the start of raw pixel data.
    fn remaining_after_single_whitespace(&self) -> &'a [u8] {
        let start = (self.pos + 1).min(self.bytes.len());
        &self.bytes[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("ocr-pipeline-loader-test-{}-{name}", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn loads_a_valid_ppm() {
        let mut body = b"P6\n2 2\n255\n".to_vec();
        body.extend(std::iter::repeat(0u8).take(2 * 2 * 3));
        let path = write_temp("valid.ppm", &body);

        let image = NetpbmImageLoader.load(&path).unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.byte_len(), 12);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn loads_a_valid_pgm_with_comment_in_header() {
        let mut body = b"P5\n# a comment\n3 1\n255\n".to_vec();
        body.extend(std::iter::repeat(128u8).take(3));
        let path = write_temp("valid.pgm", &body);

        let image = NetpbmImageLoader.load(&path).unwrap();
        assert_eq!(image.width, 3);
        assert_eq!(image.height, 1);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn unsupported_extension_is_an_io_error() {
        let path = write_temp("file.jpg", b"not a netpbm file");
        let err = NetpbmImageLoader.load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn truncated_pixel_data_is_an_io_error() {
        let body = b"P6\n4 4\n255\n".to_vec();
        let path = write_temp("truncated.ppm", &body);
        let err = NetpbmImageLoader.load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = NetpbmImageLoader.load(Path::new("/nonexistent/path/image.ppm")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
