// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration
///
/// Holds every CLI argument after security validation: paths are
/// canonicalized (where they must already exist) and every numeric flag is
/// range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub quiet: bool,
    pub config: Option<PathBuf>,
    pub workers: Option<usize>,
    pub memory_threshold: Option<f32>,
    pub adaptive_scaling: bool,
    pub output_format: String,
    pub output: Option<PathBuf>,
    pub progress: bool,
}

/// Validated command variants
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        inputs: Vec<PathBuf>,
        recursive: bool,
        include: Vec<String>,
        exclude: Vec<String>,
        orient: bool,
        rectify: bool,
        multi_scale: bool,
    },
    ValidateConfig {
        config: PathBuf,
    },
}

/// Parse and validate CLI arguments
///
/// 1. Parse CLI with clap.
/// 2. Apply [`SecureArgParser`] to every path and numeric argument.
/// 3. Return [`ValidatedCli`] on success.
///
/// # Errors
///
/// Returns `ParseError` if any validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = match cli.config {
        Some(path) => {
            SecureArgParser::validate_path(&path.to_string_lossy())?;
            Some(path)
        }
        None => None,
    };

    if let Some(workers) = cli.workers {
        SecureArgParser::validate_number("workers", workers, Some(1), Some(256))?;
    }

    if let Some(threshold) = cli.memory_threshold {
        SecureArgParser::validate_number("memory-threshold", threshold, Some(0.0), Some(1.0))?;
    }

    if let Some(ref output) = cli.output {
        SecureArgParser::validate_output_argument(&output.to_string_lossy())?;
    }

    let command = match cli.command {
        Commands::Run { inputs, recursive, include, exclude, orient, rectify, multi_scale } => {
            let mut validated_inputs = Vec::with_capacity(inputs.len());
            for input in &inputs {
                validated_inputs.push(SecureArgParser::validate_path(&input.to_string_lossy())?);
            }
            for pattern in include.iter().chain(exclude.iter()) {
                SecureArgParser::validate_argument(pattern)?;
            }

            ValidatedCommand::Run {
                inputs: validated_inputs,
                recursive,
                include,
                exclude,
                orient,
                rectify,
                multi_scale,
            }
        }
        Commands::ValidateConfig { config } => {
            let validated_config = SecureArgParser::validate_path(&config.to_string_lossy())?;
            ValidatedCommand::ValidateConfig { config: validated_config }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
        workers: cli.workers,
        memory_threshold: cli.memory_threshold,
        adaptive_scaling: cli.adaptive_scaling,
        output_format: cli.output_format,
        output: cli.output,
        progress: cli.progress,
    })
}
