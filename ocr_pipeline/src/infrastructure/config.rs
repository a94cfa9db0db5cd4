// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layered Configuration Resolution (§10.4)
//!
//! Builds the final [`PipelineConfig`] from, in ascending precedence: the
//! built-in defaults, an optional TOML file, environment variables
//! prefixed `OCR_`, and finally the CLI flags captured in
//! [`ValidatedCli`]. Validation happens once here, eagerly, before the
//! batch façade starts any worker (§7 "Batch-level errors halt the batch
//! before any workers are started").

use std::path::Path;

use config::{Config, File};
use ocr_pipeline_bootstrap::cli::{ValidatedCli, ValidatedCommand};
use ocr_pipeline_domain::value_objects::{MemorySize, PipelineConfig};
use ocr_pipeline_domain::PipelineError;

/// Loads and resolves the full layered configuration.
///
/// `config_path` is `None` when the caller has no `--config` file (every
/// field then comes from defaults/env/CLI alone).
pub fn resolve_config(config_path: Option<&Path>, cli: &ValidatedCli) -> Result<PipelineConfig, PipelineError> {
    // Every field of `PipelineConfig` (and its nested stage configs) carries
    // `#[serde(default)]`, so an empty source set still deserializes to the
    // built-in defaults; the file and environment sources below only need to
    // supply the fields a caller actually wants to override.
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(config::Environment::with_prefix("OCR").separator("__"));

    let resolved = builder
        .build()
        .map_err(|e| PipelineError::Config(format!("failed to build configuration: {e}")))?;

    let mut pipeline_config: PipelineConfig =
        resolved.try_deserialize().map_err(|e| PipelineError::Config(format!("failed to deserialize configuration: {e}")))?;

    apply_cli_overrides(&mut pipeline_config, cli)?;
    pipeline_config.validate()?;
    Ok(pipeline_config)
}

/// CLI flags are the highest-precedence layer (§10.4); only flags the user
/// actually supplied (`Some(..)`/non-default booleans) override the
/// file/env-resolved value.
fn apply_cli_overrides(config: &mut PipelineConfig, cli: &ValidatedCli) -> Result<(), PipelineError> {
    if let Some(workers) = cli.workers {
        config.parallel.workers = workers;
    }
    if let Some(threshold) = cli.memory_threshold {
        config.parallel.memory_threshold = threshold;
    }
    if cli.adaptive_scaling {
        config.parallel.adaptive_scaling = true;
    }
    if cli.progress {
        config.parallel.show_progress = true;
    }

    if let ValidatedCommand::Run { recursive, include, exclude, orient, rectify, multi_scale, .. } = &cli.command {
        config.discovery.recursive = *recursive;
        if !include.is_empty() {
            config.discovery.include = include.clone();
        }
        if !exclude.is_empty() {
            config.discovery.exclude = exclude.clone();
        }
        if *orient {
            config.orient.enabled = true;
        }
        if *rectify {
            config.rectify.enabled = true;
        }
        if *multi_scale {
            config.detect.multi_scale.enabled = true;
        }
    }

    Ok(())
}

/// Parses a memory-limit string like `"512MB"` into a [`MemorySize`] (§4.6
/// "memory-limit string parsing"). An unrecognised unit is a batch-fatal
/// configuration error, surfaced before any worker starts.
pub fn parse_memory_limit(raw: &str) -> Result<MemorySize, PipelineError> {
    MemorySize::parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_pipeline_bootstrap::cli::ValidatedCli;
    use std::path::PathBuf;

    fn base_cli() -> ValidatedCli {
        ValidatedCli {
            command: ValidatedCommand::Run {
                inputs: vec![],
                recursive: false,
                include: vec![],
                exclude: vec![],
                orient: false,
                rectify: false,
                multi_scale: false,
            },
            verbose: false,
            quiet: false,
            config: None,
            workers: None,
            memory_threshold: None,
            adaptive_scaling: false,
            output_format: "text".to_string(),
            output: None,
            progress: false,
        }
    }

    #[test]
    fn no_config_file_resolves_to_defaults_with_cli_overrides() {
        let mut cli = base_cli();
        cli.workers = Some(4);
        cli.adaptive_scaling = true;
        let config = resolve_config(None, &cli).expect("defaults should resolve");
        assert_eq!(config.parallel.workers, 4);
        assert!(config.parallel.adaptive_scaling);
    }

    #[test]
    fn cli_run_flags_enable_optional_stages() {
        let mut cli = base_cli();
        cli.command = ValidatedCommand::Run {
            inputs: vec![],
            recursive: true,
            include: vec!["*.png".to_string()],
            exclude: vec![],
            orient: true,
            rectify: true,
            multi_scale: true,
        };
        let config = resolve_config(None, &cli).expect("defaults should resolve");
        assert!(config.orient.enabled);
        assert!(config.rectify.enabled);
        assert!(config.detect.multi_scale.enabled);
        assert!(config.discovery.recursive);
        assert_eq!(config.discovery.include, vec!["*.png".to_string()]);
    }

    #[test]
    fn missing_config_file_is_reported_as_a_config_error() {
        let cli = base_cli();
        let missing = PathBuf::from("/nonexistent/ocr-pipeline-config.toml");
        assert!(resolve_config(Some(&missing), &cli).is_err());
    }

    #[test]
    fn memory_limit_string_parses_decimal_units() {
        let parsed = parse_memory_limit("512MB").expect("512MB should parse");
        assert!(!parsed.is_unset());
    }

    #[test]
    fn unrecognised_memory_unit_is_a_config_error() {
        assert!(parse_memory_limit("512XB").is_err());
    }
}
