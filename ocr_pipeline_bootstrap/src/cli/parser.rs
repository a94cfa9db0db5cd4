// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap.
//!
//! This module defines the CLI structure and handles argument parsing.
//! Security validation happens in the validator module after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser, Debug, Clone)]
#[command(name = "ocr-pipeline")]
#[command(about = concat!("Parallel OCR execution core v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file path (TOML/YAML/JSON; §10.4 file + env + CLI precedence)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the worker pool size (§4.2 `WorkerBudget`)
    ///
    /// Default: number of available CPU cores, clamped to [1, 256].
    #[arg(long)]
    pub workers: Option<usize>,

    /// Override the memory-pressure scale-down threshold, in `[0, 1]` (§4.2)
    #[arg(long)]
    pub memory_threshold: Option<f32>,

    /// Enable dynamic worker-count scaling under memory pressure (§4.2)
    #[arg(long)]
    pub adaptive_scaling: bool,

    /// Output format for the final batch report
    #[arg(long, value_parser = parse_output_format, default_value = "text")]
    pub output_format: String,

    /// Write the batch report to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Show a live progress line while the batch runs (§4.7)
    #[arg(long)]
    pub progress: bool,
}

fn parse_output_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" | "csv" => Ok(s.to_string()),
        other => Err(format!("unsupported output format '{other}' (expected text, json, or csv)")),
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a batch of images through the pipeline
    Run {
        /// Image files, directories, or glob patterns to process
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Recurse into subdirectories when an input is a directory (§4.6)
        #[arg(short, long)]
        recursive: bool,

        /// Glob patterns of files to include (default: all supported image extensions)
        #[arg(long)]
        include: Vec<String>,

        /// Glob patterns of files to exclude
        #[arg(long)]
        exclude: Vec<String>,

        /// Enable the Orient stage (§4.3.1)
        #[arg(long)]
        orient: bool,

        /// Enable the Rectify stage (§4.3.2)
        #[arg(long)]
        rectify: bool,

        /// Enable multi-scale detection (§4.3.3)
        #[arg(long)]
        multi_scale: bool,
    },

    /// Validate a configuration file without running a batch
    ValidateConfig {
        /// Configuration file path
        config: PathBuf,
    },
}

/// Parse command-line arguments using clap
///
/// Clap handles `--help` and `--version` automatically, exiting the process.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_minimal_run_invocation() {
        let cli = Cli::parse_from(["ocr-pipeline", "run", "a.png", "b.png"]);
        match cli.command {
            Commands::Run { inputs, .. } => assert_eq!(inputs.len(), 2),
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn rejects_unsupported_output_format() {
        let result = Cli::try_parse_from(["ocr-pipeline", "--output-format", "xml", "run", "a.png"]);
        assert!(result.is_err());
    }
}
