// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Aggregate run statistics (§3 `BatchStats`), assembled by the scheduler
//! once the collector has drained every result.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub workers: usize,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    #[serde(with = "duration_ms")]
    pub per_image_avg: Duration,
    /// Images processed per second over the whole run.
    pub throughput: f64,
}

impl BatchStats {
    pub fn new(total: usize, processed: usize, failed: usize, workers: usize, elapsed: Duration) -> Self {
        let per_image_avg = if processed > 0 { elapsed / processed as u32 } else { Duration::ZERO };
        let throughput = if elapsed.as_secs_f64() > 0.0 { processed as f64 / elapsed.as_secs_f64() } else { 0.0 };
        Self { total, processed, failed, workers, elapsed, per_image_avg, throughput }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}
