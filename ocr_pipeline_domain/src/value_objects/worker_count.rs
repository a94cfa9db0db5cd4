// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Count Value Object
//!
//! `WorkerCount` is the bounds-checked newtype around the scheduler's
//! concurrency level. It underlies both the fixed `workers` configuration
//! option (§6) and the dynamic `WorkerBudget.current` capacity the Worker
//! Budget state machine moves between `min` and `max` (§4.2).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerCount(usize);

impl WorkerCount {
    /// Worker Budget never scales below this floor (§4.2 default `min`).
    pub const MIN_WORKERS: usize = 1;
    /// A generous ceiling; callers that want a lower cap pass it explicitly
    /// as `max`/`workers` rather than relying on this constant.
    pub const MAX_WORKERS: usize = 256;

    /// Clamps `count` into `[MIN_WORKERS, MAX_WORKERS]`. Clamping rather
    /// than rejecting keeps callers (config loaders, the ticker's
    /// increment/decrement step) free of an error path for a value that is
    /// always safe to saturate.
    pub fn new(count: usize) -> Self {
        WorkerCount(count.clamp(Self::MIN_WORKERS, Self::MAX_WORKERS))
    }

    pub fn count(self) -> usize {
        self.0
    }

    /// The `workers` default: host CPU count (§6).
    pub fn default_for_system() -> Self {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        WorkerCount::new(cores)
    }

    /// One step of the Worker Budget ticker's decrement, floored at `min`.
    pub fn decrement(self, floor: WorkerCount) -> Self {
        WorkerCount::new(self.0.saturating_sub(1).max(floor.0))
    }

    /// One step of the Worker Budget ticker's increment, ceiled at `max`.
    pub fn increment(self, ceiling: WorkerCount) -> Self {
        WorkerCount::new((self.0 + 1).min(ceiling.0))
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} workers", self.0)
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::default_for_system()
    }
}

impl From<usize> for WorkerCount {
    fn from(count: usize) -> Self {
        WorkerCount::new(count)
    }
}

impl From<WorkerCount> for usize {
    fn from(w: WorkerCount) -> Self {
        w.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_to_bounds() {
        assert_eq!(WorkerCount::new(0).count(), WorkerCount::MIN_WORKERS);
        assert_eq!(WorkerCount::new(10_000).count(), WorkerCount::MAX_WORKERS);
        assert_eq!(WorkerCount::new(4).count(), 4);
    }

    #[test]
    fn decrement_stops_at_floor() {
        let floor = WorkerCount::new(1);
        let mut w = WorkerCount::new(2);
        w = w.decrement(floor);
        assert_eq!(w.count(), 1);
        w = w.decrement(floor);
        assert_eq!(w.count(), 1);
    }

    #[test]
    fn increment_stops_at_ceiling() {
        let ceiling = WorkerCount::new(4);
        let mut w = WorkerCount::new(3);
        w = w.increment(ceiling);
        assert_eq!(w.count(), 4);
        w = w.increment(ceiling);
        assert_eq!(w.count(), 4);
    }

    #[test]
    fn default_for_system_is_at_least_one() {
        assert!(WorkerCount::default_for_system().count() >= 1);
    }
}
