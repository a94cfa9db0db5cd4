// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resource Monitor (§4.1) and Worker Budget (§4.2)
//!
//! The Resource Monitor samples process and host memory through
//! [`ocr_pipeline_bootstrap::platform::Platform`] and exposes a pressure
//! ratio. The Worker Budget is a dynamic semaphore whose capacity a ticker
//! moves between `min` and `max` in response to that pressure signal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ocr_pipeline_bootstrap::platform::{create_platform, Platform};
use ocr_pipeline_domain::services::{Reading, ResourceMonitor};
use ocr_pipeline_domain::{MemorySize, WorkerCount};
use tokio::sync::{Semaphore, SemaphorePermit};

/// Samples process/host memory via the bootstrap platform abstraction.
///
/// `memory_limit` is `PipelineConfig::memory_limit`; when unset (`0`),
/// pressure is derived from host-wide available/total memory instead (§4.1
/// "otherwise `1 − systemAvailableBytes / systemTotalBytes`").
pub struct PlatformResourceMonitor {
    platform: Box<dyn Platform>,
    memory_limit: MemorySize,
}

impl PlatformResourceMonitor {
    pub fn new(memory_limit: MemorySize) -> Self {
        Self { platform: create_platform(), memory_limit }
    }
}

impl ResourceMonitor for PlatformResourceMonitor {
    fn sample(&self) -> Reading {
        let process_heap_bytes = match self.platform.process_resident_memory() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "process memory sample failed");
                return Reading::no_pressure();
            }
        };

        let (system_available_bytes, system_total_bytes) =
            match (self.platform.available_memory(), self.platform.total_memory()) {
                (Ok(available), Ok(total)) => (available, total),
                (available, total) => {
                    tracing::debug!(?available, ?total, "host memory sample failed");
                    return Reading::no_pressure();
                }
            };

        let pressure_ratio = if !self.memory_limit.is_unset() {
            process_heap_bytes as f32 / self.memory_limit.bytes() as f32
        } else if system_total_bytes > 0 {
            1.0 - (system_available_bytes as f32 / system_total_bytes as f32)
        } else {
            0.0
        };

        Reading { process_heap_bytes, system_available_bytes, system_total_bytes, pressure_ratio: pressure_ratio.clamp(0.0, 1.0) }
    }
}

/// The three states of the Worker Budget ticker (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetState {
    Idle,
    Scaling,
    Steady,
}

/// A dynamic concurrency cap over a `tokio::sync::Semaphore`, whose permit
/// count the ticker (when `adaptiveScaling = true`) moves between `min` and
/// `max` in response to [`ResourceMonitor`] pressure readings.
///
/// Capacity changes apply only to subsequent `acquire` calls; permits
/// already handed out are never revoked (§4.2 "in-flight slots are not
/// revoked"), which is exactly `tokio::sync::Semaphore::forget`/`add_permits`
/// semantics: shrinking "forgets" permits as they are released rather than
/// yanking them from workers currently holding one.
pub struct WorkerBudget {
    semaphore: Arc<Semaphore>,
    current: AtomicUsize,
    min: WorkerCount,
    max: WorkerCount,
    adaptive: bool,
}

impl WorkerBudget {
    pub fn new(initial: WorkerCount, min: WorkerCount, max: WorkerCount, adaptive: bool) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(initial.count())),
            current: AtomicUsize::new(initial.count()),
            min,
            max,
            adaptive,
        }
    }

    pub fn current(&self) -> WorkerCount {
        WorkerCount::new(self.current.load(Ordering::SeqCst))
    }

    /// Blocks until a slot is available, or the semaphore is closed (on
    /// shutdown). Corresponds to §4.2's `Acquire(ctx) → slot | Cancelled`;
    /// callers combine this with `tokio::select!` against a
    /// [`ocr_pipeline_bootstrap::shutdown::CancellationToken`] for the
    /// `Cancelled` arm.
    pub async fn acquire(&self) -> Option<SemaphorePermit<'_>> {
        self.semaphore.acquire().await.ok()
    }

    /// One ticker step (§4.2's state machine). Returns the state this tick
    /// transitioned into, for logging/testing.
    pub fn tick(&self, monitor: &dyn ResourceMonitor, high_mark: f32, low_mark: f32) -> BudgetState {
        if !self.adaptive {
            return BudgetState::Idle;
        }

        let reading = monitor.sample();
        let current = self.current();

        if reading.under_pressure(high_mark) {
            let next = current.decrement(self.min);
            self.set_capacity(next);
            if next != current {
                tracing::debug!(from = current.count(), to = next.count(), pressure = reading.pressure_ratio, "worker budget scaling down");
            }
            BudgetState::Scaling
        } else if !reading.under_pressure(low_mark) && current < self.max {
            let next = current.increment(self.max);
            self.set_capacity(next);
            if next != current {
                tracing::debug!(from = current.count(), to = next.count(), pressure = reading.pressure_ratio, "worker budget scaling up");
            }
            BudgetState::Scaling
        } else {
            BudgetState::Steady
        }
    }

    fn set_capacity(&self, next: WorkerCount) {
        let prev = self.current.swap(next.count(), Ordering::SeqCst);
        if next.count() > prev {
            self.semaphore.add_permits(next.count() - prev);
        } else if next.count() < prev {
            // `forget_permits` removes capacity without requiring the caller
            // to hold a permit; any already-acquired permits still release
            // normally when dropped (the "not revoked" guarantee).
            self.semaphore.forget_permits(prev - next.count());
        }
    }

    /// Spawns the ticker loop (default interval 500ms, §4.2); a no-op future
    /// when `adaptiveScaling = false` so callers can always spawn it.
    pub async fn run_ticker(
        budget: Arc<WorkerBudget>,
        monitor: Arc<dyn ResourceMonitor>,
        high_mark: f32,
        low_mark: f32,
        interval: Duration,
        shutdown: ocr_pipeline_bootstrap::shutdown::CancellationToken,
    ) {
        if !budget.adaptive {
            return;
        }
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    budget.tick(monitor.as_ref(), high_mark, low_mark);
                }
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedMonitor(Mutex<f32>);
    impl ResourceMonitor for FixedMonitor {
        fn sample(&self) -> Reading {
            let ratio = *self.0.lock().unwrap();
            Reading { process_heap_bytes: 0, system_available_bytes: 0, system_total_bytes: 1, pressure_ratio: ratio }
        }
    }

    #[test]
    fn fixed_worker_budget_ignores_pressure_when_not_adaptive() {
        let budget = WorkerBudget::new(WorkerCount::new(4), WorkerCount::new(1), WorkerCount::new(4), false);
        let monitor = FixedMonitor(Mutex::new(0.95));
        let state = budget.tick(&monitor, 0.8, 0.7);
        assert_eq!(state, BudgetState::Idle);
        assert_eq!(budget.current().count(), 4);
    }

    #[test]
    fn adaptive_budget_scales_down_under_pressure() {
        let budget = WorkerBudget::new(WorkerCount::new(4), WorkerCount::new(1), WorkerCount::new(4), true);
        let monitor = FixedMonitor(Mutex::new(0.95));
        let state = budget.tick(&monitor, 0.8, 0.7);
        assert_eq!(state, BudgetState::Scaling);
        assert_eq!(budget.current().count(), 3);
    }

    #[test]
    fn adaptive_budget_scales_down_to_floor_and_no_further() {
        let budget = WorkerBudget::new(WorkerCount::new(1), WorkerCount::new(1), WorkerCount::new(4), true);
        let monitor = FixedMonitor(Mutex::new(0.95));
        budget.tick(&monitor, 0.8, 0.7);
        assert_eq!(budget.current().count(), 1);
    }

    #[test]
    fn adaptive_budget_scales_up_below_low_mark() {
        let budget = WorkerBudget::new(WorkerCount::new(1), WorkerCount::new(1), WorkerCount::new(4), true);
        let monitor = FixedMonitor(Mutex::new(0.1));
        let state = budget.tick(&monitor, 0.8, 0.7);
        assert_eq!(state, BudgetState::Scaling);
        assert_eq!(budget.current().count(), 2);
    }

    #[test]
    fn adaptive_budget_is_steady_between_marks() {
        let budget = WorkerBudget::new(WorkerCount::new(2), WorkerCount::new(1), WorkerCount::new(4), true);
        let monitor = FixedMonitor(Mutex::new(0.75));
        let state = budget.tick(&monitor, 0.8, 0.7);
        assert_eq!(state, BudgetState::Steady);
        assert_eq!(budget.current().count(), 2);
    }

    #[tokio::test]
    async fn acquire_hands_out_up_to_current_capacity() {
        let budget = WorkerBudget::new(WorkerCount::new(2), WorkerCount::new(1), WorkerCount::new(2), false);
        let a = budget.acquire().await;
        let b = budget.acquire().await;
        assert!(a.is_some());
        assert!(b.is_some());
    }
}
