// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Parallel OCR Execution Core — Demonstration CLI
//!
//! Wires the bootstrap layer (CLI parsing, signal handling, shutdown
//! coordination, exit codes) to the core's Batch Façade. The concrete
//! Detect/Recognise/Orient/Rectify engines instantiated here are the
//! deterministic stand-ins documented in [`ocr_pipeline::infrastructure::engines`];
//! a real deployment would inject its own inference engines behind the same
//! trait boundary.

use std::path::PathBuf;
use std::sync::Arc;

use ocr_pipeline::infrastructure::config::resolve_config;
use ocr_pipeline::infrastructure::engines::{
    IdentityOrientEngine, IdentityRectifyEngine, NullRecogniseEngine, WholeImageDetectEngine,
};
use ocr_pipeline::infrastructure::loader::NetpbmImageLoader;
use ocr_pipeline::infrastructure::logging::init_logging;
use ocr_pipeline::infrastructure::resource::PlatformResourceMonitor;
use ocr_pipeline::infrastructure::stages::StageSet;
use ocr_pipeline::{run_batch, PipelineError};
use ocr_pipeline_bootstrap::cli::{ValidatedCli, ValidatedCommand};
use ocr_pipeline_bootstrap::config::LogLevel;
use ocr_pipeline_bootstrap::shutdown::ShutdownCoordinator;
use ocr_pipeline_bootstrap::{bootstrap_cli, result_to_exit_code, signals};
use ocr_pipeline_domain::services::Capability;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return ocr_pipeline_bootstrap::ExitCode::UsageError.into();
        }
    };

    init_logging(LogLevel::from_flags(cli.verbose, cli.quiet));

    result_to_exit_code(run(cli).await)
}

async fn run(cli: ValidatedCli) -> Result<(), PipelineError> {
    match cli.command.clone() {
        ValidatedCommand::ValidateConfig { config } => validate_config_command(&config, &cli),
        ValidatedCommand::Run { .. } => run_command(cli).await,
    }
}

fn validate_config_command(config_path: &PathBuf, cli: &ValidatedCli) -> Result<(), PipelineError> {
    resolve_config(Some(config_path), cli)?;
    println!("{}: configuration is valid", config_path.display());
    Ok(())
}

async fn run_command(cli: ValidatedCli) -> Result<(), PipelineError> {
    let ValidatedCommand::Run { inputs, orient, rectify, .. } = cli.command.clone() else {
        unreachable!("dispatched only for ValidatedCommand::Run");
    };

    let config = Arc::new(resolve_config(cli.config.as_deref(), &cli)?);

    let shutdown = ShutdownCoordinator::default();
    signals::install(shutdown.clone());

    let stages = StageSet {
        orient: if orient { Capability::Present(Arc::new(IdentityOrientEngine)) } else { Capability::Absent },
        rectify: if rectify { Capability::Present(Arc::new(IdentityRectifyEngine)) } else { Capability::Absent },
        detect: Arc::new(WholeImageDetectEngine::default()),
        recognise: Arc::new(NullRecogniseEngine::default()),
    };

    let result = run_batch(
        inputs,
        Arc::clone(&config),
        Arc::new(NetpbmImageLoader),
        stages,
        Arc::new(PlatformResourceMonitor::new(config.memory_limit)),
        shutdown.token(),
    )
    .await?;

    if let Some(output_path) = &cli.output {
        result.save(&cli.output_format, output_path, cli.quiet)?;
    } else if !cli.quiet {
        print!("{}", result.render(&cli.output_format)?);
    }
    result.print_stats(cli.quiet);

    if result.cancelled {
        return Err(PipelineError::Cancelled);
    }
    Ok(())
}
