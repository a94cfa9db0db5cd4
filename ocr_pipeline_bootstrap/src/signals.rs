// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! Wires OS termination signals (SIGINT/SIGTERM on Unix, Ctrl-C on Windows)
//! into a [`ShutdownCoordinator`], so the scheduler's cooperative
//! cancellation (§4.5) is triggered the same way whether the batch finishes
//! naturally or the operator interrupts it.

use crate::shutdown::ShutdownCoordinator;

/// Spawns a background task that calls [`ShutdownCoordinator::initiate_shutdown`]
/// the first time a termination signal arrives. A second signal while
/// already shutting down is logged but otherwise ignored — the grace-period
/// timeout in [`ShutdownCoordinator::wait_for_shutdown`] is what bounds how
/// long the process waits before the caller should force-exit.
pub fn install(coordinator: ShutdownCoordinator) {
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("termination signal received, initiating graceful shutdown");
        coordinator.initiate_shutdown();
    });
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(windows)]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}
