// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A console [`ProgressObserver`] (§4.5 "Progress"), attached only when
//! `showProgress = true`. All output goes through `tracing` rather than a
//! bare `println!`, so progress lines share the same formatter and
//! filtering as the rest of the run.

use async_trait::async_trait;
use ocr_pipeline_domain::services::{ProgressObserver, ProgressSnapshot};

pub struct ConsoleProgressObserver;

#[async_trait]
impl ProgressObserver for ConsoleProgressObserver {
    async fn on_started(&self, total: usize) {
        tracing::info!(total, "batch started");
    }

    async fn on_image_failed(&self, index: usize) {
        tracing::debug!(index, "image failed");
    }

    async fn on_progress(&self, snapshot: ProgressSnapshot) {
        tracing::info!(
            completed = snapshot.completed,
            failed = snapshot.failed,
            started = snapshot.started,
            "progress"
        );
    }

    async fn on_finished(&self, snapshot: ProgressSnapshot) {
        tracing::info!(completed = snapshot.completed, failed = snapshot.failed, "batch finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn observer_methods_do_not_panic() {
        let observer = ConsoleProgressObserver;
        observer.on_started(10).await;
        observer.on_image_completed(0).await;
        observer.on_image_failed(1).await;
        observer.on_progress(ProgressSnapshot { started: 10, completed: 1, failed: 1, bytes_in: 0 }).await;
        observer.on_finished(ProgressSnapshot { started: 10, completed: 9, failed: 1, bytes_in: 0 }).await;
    }
}
