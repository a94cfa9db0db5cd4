// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resource Monitor Contract (§4.1)
//!
//! The domain layer only defines the contract; the actual process/host
//! memory sampling is a platform concern implemented in the bootstrap
//! crate (`ocr_pipeline_bootstrap::platform`) and wired in by
//! `ocr_pipeline::infrastructure::runtime::resource_manager`.

/// One memory reading. `pressure_ratio` is always in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub process_heap_bytes: u64,
    pub system_available_bytes: u64,
    pub system_total_bytes: u64,
    pub pressure_ratio: f32,
}

impl Reading {
    /// A reading that reports no pressure, used when sampling fails (§4.1
    /// "Sampling errors are never fatal; on failure the reading reports
    /// pressureRatio = 0").
    pub fn no_pressure() -> Self {
        Reading { process_heap_bytes: 0, system_available_bytes: 0, system_total_bytes: 0, pressure_ratio: 0.0 }
    }

    pub fn under_pressure(&self, threshold: f32) -> bool {
        self.pressure_ratio >= threshold
    }
}

/// Samples process and host memory. Implementations must be non-blocking
/// and cheap (≤1ms typical, §4.1) and must never panic on a sampling
/// failure — they report [`Reading::no_pressure`] instead.
pub trait ResourceMonitor: Send + Sync {
    /// `pressureRatio = processHeapBytes / memoryLimitBytes` when a limit is
    /// configured, otherwise `1 - systemAvailableBytes / systemTotalBytes`.
    fn sample(&self) -> Reading;

    fn under_pressure(&self, threshold: f32) -> bool {
        self.sample().under_pressure(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_pressure_is_inclusive_of_threshold() {
        let r = Reading { process_heap_bytes: 80, system_available_bytes: 0, system_total_bytes: 100, pressure_ratio: 0.8 };
        assert!(r.under_pressure(0.8));
        assert!(!r.under_pressure(0.81));
    }

    #[test]
    fn no_pressure_reading_reports_zero() {
        assert_eq!(Reading::no_pressure().pressure_ratio, 0.0);
    }
}
