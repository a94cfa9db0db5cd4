// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Concurrency Metrics
//!
//! Three gauges describing the Worker Budget's live state: how many
//! workers are currently active, the ticker's current capacity ceiling,
//! and the last observed memory pressure ratio. These are served
//! in-process (logged periodically and readable via [`ConcurrencyMetrics`]
//! getters), not scraped by a metrics collector — this crate carries no
//! `prometheus` dependency, so the gauges are plain atomics rather than a
//! `prometheus::Gauge` registry.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Live view of the Worker Budget, updated by the ticker and the scheduler.
/// `pressure_ratio` is stored as `f32` bits in an `AtomicU32` since `AtomicF32`
/// does not exist in `std`.
#[derive(Default)]
pub struct ConcurrencyMetrics {
    workers_active: AtomicU64,
    workers_capacity: AtomicU32,
    pressure_ratio_bits: AtomicU32,
}

impl ConcurrencyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_workers_active(&self, count: usize) {
        self.workers_active.store(count as u64, Ordering::Relaxed);
    }

    pub fn workers_active(&self) -> u64 {
        self.workers_active.load(Ordering::Relaxed)
    }

    pub fn set_workers_capacity(&self, count: usize) {
        self.workers_capacity.store(count as u32, Ordering::Relaxed);
    }

    pub fn workers_capacity(&self) -> u32 {
        self.workers_capacity.load(Ordering::Relaxed)
    }

    pub fn set_pressure_ratio(&self, ratio: f32) {
        self.pressure_ratio_bits.store(ratio.to_bits(), Ordering::Relaxed);
    }

    pub fn pressure_ratio(&self) -> f32 {
        f32::from_bits(self.pressure_ratio_bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauges_round_trip_through_atomics() {
        let metrics = ConcurrencyMetrics::new();
        metrics.set_workers_active(3);
        metrics.set_workers_capacity(8);
        metrics.set_pressure_ratio(0.42);

        assert_eq!(metrics.workers_active(), 3);
        assert_eq!(metrics.workers_capacity(), 8);
        assert!((metrics.pressure_ratio() - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn default_metrics_start_at_zero() {
        let metrics = ConcurrencyMetrics::new();
        assert_eq!(metrics.workers_active(), 0);
        assert_eq!(metrics.workers_capacity(), 0);
        assert_eq!(metrics.pressure_ratio(), 0.0);
    }
}
