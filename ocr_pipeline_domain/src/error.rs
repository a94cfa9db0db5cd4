// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Error Taxonomy
//!
//! A single error enum shared by every layer of the OCR execution core.
//! Domain code never reaches for `anyhow`; every fallible domain operation
//! returns `Result<T, PipelineError>`, and the application layer converts
//! heterogeneous failures (config files, CLI flags, file discovery) into one
//! of these variants at the point they cross into the core.

use std::fmt;
use thiserror::Error;

/// The four named pipeline stages, used to attribute a [`PipelineError::Stage`]
/// or [`PipelineError::OptionalStageFailure`] to the component that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Orient,
    Rectify,
    Detect,
    Recognise,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageName::Orient => "orient",
            StageName::Rectify => "rectify",
            StageName::Detect => "detect",
            StageName::Recognise => "recognise",
        };
        write!(f, "{s}")
    }
}

/// The error taxonomy for the parallel OCR execution core.
///
/// `Config` and `Resolve` are batch-level: they are surfaced before any
/// worker starts and halt the whole batch. Every other variant is per-image
/// and is recorded into the batch's error map without halting the run,
/// unless it is wrapped in [`PipelineError::Cancelled`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration, detected before any work starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A model or dictionary file named by the configuration could not be resolved.
    #[error("could not resolve resource: {0}")]
    Resolve(String),

    /// An image was unreadable or in an unsupported format.
    #[error("I/O error: {0}")]
    Io(String),

    /// A mandatory stage (Detect or Recognise) failed for one image.
    #[error("stage '{stage}' failed: {cause}")]
    Stage { stage: StageName, cause: String },

    /// An optional stage (Orient or Rectify) failed; never fatal, the image
    /// continues through the pipeline unmodified. Kept as a typed variant
    /// (rather than just a log line) so callers can inspect it in tests.
    #[error("optional stage '{stage}' failed, continuing unmodified: {cause}")]
    OptionalStageFailure { stage: StageName, cause: String },

    /// The worker budget could not be acquired for this image (e.g. capacity
    /// dropped to zero and the batch was cancelled while waiting).
    #[error("resource exhausted: {0}")]
    Resource(String),

    /// The batch's cancellation token was triggered.
    #[error("cancelled")]
    Cancelled,

    /// An invariant was violated by data the core produced itself (as
    /// opposed to bad input) — a programming error, not a data error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn stage(stage: StageName, cause: impl Into<String>) -> Self {
        PipelineError::Stage { stage, cause: cause.into() }
    }

    pub fn optional_stage(stage: StageName, cause: impl Into<String>) -> Self {
        PipelineError::OptionalStageFailure { stage, cause: cause.into() }
    }

    /// True for the two variants that halt the batch before any worker starts.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, PipelineError::Config(_) | PipelineError::Resolve(_))
    }
}
