// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions, plus
//! a direct mapping from [`PipelineError`] so `main` never has to re-derive
//! which failures are usage errors versus internal ones.
//!
//! ## Exit Code Conventions
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **130/143**: Interrupted/terminated by signal

use ocr_pipeline_domain::PipelineError;
use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    #[default]
    Success = 0,

    /// General error (1)
    Error = 1,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format error (65) - malformed configuration, unreadable image
    DataError = 65,

    /// Cannot open input (66) - input path not found
    NoInput = 66,

    /// Service unavailable (69) - a named model/dictionary resource could not be resolved
    Unavailable = 69,

    /// Internal software error (70) - an invariant the core itself should guarantee was violated
    Software = 70,

    /// Cannot create output (73)
    CantCreate = 73,

    /// I/O error (74)
    IoError = 74,

    /// Temporary failure, retry (75) - worker budget exhausted
    TempFail = 75,

    /// Configuration error (78)
    Config = 78,

    /// Interrupted by signal (SIGINT) (130)
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143)
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::CantCreate => "Cannot create output file",
            ExitCode::IoError => "I/O error",
            ExitCode::TempFail => "Temporary failure, retry",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

/// Maps a batch-fatal [`PipelineError`] to the exit code `main` should
/// return. Per-image failures never reach here — they are recorded into
/// `BatchStats` instead (§7) — so every variant below represents a
/// whole-run failure.
pub fn map_error_to_exit_code(error: &PipelineError) -> ExitCode {
    match error {
        PipelineError::Config(_) => ExitCode::Config,
        PipelineError::Resolve(_) => ExitCode::Unavailable,
        PipelineError::Io(_) => ExitCode::IoError,
        PipelineError::Stage { .. } | PipelineError::OptionalStageFailure { .. } => ExitCode::DataError,
        PipelineError::Resource(_) => ExitCode::TempFail,
        PipelineError::Cancelled => ExitCode::Interrupted,
        PipelineError::Internal(_) => ExitCode::Software,
    }
}

/// Converts a top-level `Result` into a process exit code, logging the
/// error (if any) at error level before returning.
pub fn result_to_exit_code(result: Result<(), PipelineError>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            let code = map_error_to_exit_code(&e);
            tracing::error!(exit_code = code.as_i32(), "{e}");
            code.into()
        }
    }
}
