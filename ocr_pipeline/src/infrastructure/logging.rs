// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Structured Logging (§5 "thread-safe structured logger")
//!
//! Initialises `tracing-subscriber` with an `EnvFilter` seeded from the
//! resolved [`ocr_pipeline_bootstrap::config::LogLevel`] and overridable via
//! `RUST_LOG`. JSON output is used when the process is not attached to a
//! terminal, matching the teacher's log-shipping convention.

use std::io::IsTerminal;

use ocr_pipeline_bootstrap::config::LogLevel;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber. Must be called exactly once,
/// as early as possible in `main` (§10.3) — before any stage, scheduler, or
/// config-loading code emits a span.
///
/// Output format is derived from whether stdout is attached to a terminal,
/// not from any caller-supplied flag: a human at a terminal gets the
/// compact human-readable formatter, a redirected/piped stdout (the
/// log-shipping case) gets JSON lines.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    if std::io::stdout().is_terminal() {
        subscriber.init();
    } else {
        subscriber.json().init();
    }
}
