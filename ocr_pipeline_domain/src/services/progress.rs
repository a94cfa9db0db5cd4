// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Progress Observer (§4.5 "Progress")
//!
//! Invoked exclusively from the scheduler's collector task, never from a
//! worker, so implementations need no internal synchronisation (§9
//! "Progress single-threading"). Every method has a no-op default so a
//! caller that only cares about completion counts doesn't have to
//! implement the rest.

use async_trait::async_trait;

/// A snapshot handed to [`ProgressObserver::on_progress`] at most every
/// `progressInterval` (§6 default 500ms).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressSnapshot {
    pub started: usize,
    pub completed: usize,
    pub failed: usize,
    pub bytes_in: u64,
}

#[async_trait]
pub trait ProgressObserver: Send + Sync {
    async fn on_started(&self, _total: usize) {}
    async fn on_image_completed(&self, _index: usize) {}
    async fn on_image_failed(&self, _index: usize) {}
    async fn on_progress(&self, _snapshot: ProgressSnapshot) {}
    async fn on_finished(&self, _snapshot: ProgressSnapshot) {}
}

/// The default no-attached-callback behaviour (`showProgress = false`, §6).
pub struct NoopProgressObserver;

#[async_trait]
impl ProgressObserver for NoopProgressObserver {}
