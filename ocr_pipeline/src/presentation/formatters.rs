// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Text, JSON, and CSV renderings of a finished [`BatchResult`] (§6
//! `save(format, outputPath, quiet)`).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use ocr_pipeline_domain::entities::BatchStats;
use ocr_pipeline_domain::error::PipelineError;

use crate::application::batch::BatchResult;

/// Dispatches to the formatter named by `format` and writes the result to
/// `output_path`. An unrecognised format name is a configuration error —
/// the same class `--output-format`'s own CLI validation already guards
/// against, so this only fires if a caller bypasses that validation.
pub fn save(result: &BatchResult, format: &str, output_path: &Path, quiet: bool) -> Result<(), PipelineError> {
    let rendered = render(result, format)?;

    fs::write(output_path, rendered).map_err(|e| PipelineError::Io(format!("{}: {e}", output_path.display())))?;

    if !quiet {
        tracing::info!(path = %output_path.display(), format, "wrote batch results");
    }
    Ok(())
}

/// Renders `result` in `format` without writing anywhere; `save` writes this
/// to a file, `main` prints it to stdout when no `--output` path is given.
pub fn render(result: &BatchResult, format: &str) -> Result<String, PipelineError> {
    match format {
        "text" => Ok(render_text(result)),
        "json" => render_json(result),
        "csv" => Ok(render_csv(result)),
        other => Err(PipelineError::Config(format!("unsupported output format '{other}'"))),
    }
}

/// Prints `BatchStats` to stdout (§6 `printStats(quiet)`); the caller
/// already checks `quiet` before calling this, same as `save`'s own
/// `quiet` argument only gates its log line rather than the write itself.
pub fn print_stats(stats: &BatchStats) {
    println!(
        "processed {}/{} images ({} failed) in {:.2?} — {:.1} img/s, {} workers",
        stats.processed, stats.total, stats.failed, stats.elapsed, stats.throughput, stats.workers
    );
}

fn render_text(result: &BatchResult) -> String {
    let mut out = String::new();
    for (index, slot) in result.results.iter().enumerate() {
        match slot {
            Some(image) => {
                let _ = writeln!(out, "[{index}] {}x{} regions={}", image.width, image.height, image.regions.len());
                for region in &image.regions {
                    let _ = writeln!(out, "    {:.2} \"{}\"", region.rec_conf, region.text);
                }
            }
            None => {
                let _ = writeln!(out, "[{index}] (no result)");
            }
        }
    }
    if !result.errors.is_empty() {
        let _ = writeln!(out, "\nerrors:");
        for (path, error) in &result.errors {
            let _ = writeln!(out, "  {}: {error}", path.display());
        }
    }
    out
}

fn render_json(result: &BatchResult) -> Result<String, PipelineError> {
    let errors: Vec<_> = result.errors.iter().map(|(path, e)| (path.display().to_string(), e.to_string())).collect();
    let document = serde_json::json!({
        "results": result.results,
        "errors": errors,
        "stats": result.stats,
        "cancelled": result.cancelled,
    });
    serde_json::to_string_pretty(&document).map_err(|e| PipelineError::Internal(format!("failed to serialise batch result: {e}")))
}

fn render_csv(result: &BatchResult) -> String {
    let mut out = String::from("index,width,height,region_count,avg_det_conf,error\n");
    for (index, slot) in result.results.iter().enumerate() {
        match slot {
            Some(image) => {
                let _ = writeln!(out, "{index},{},{},{},{:.4},", image.width, image.height, image.regions.len(), image.avg_det_conf);
            }
            None => {
                let error = result
                    .errors
                    .values()
                    .next()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "cancelled before this image was reached".to_string());
                let _ = writeln!(out, "{index},,,,{}", csv_escape(&error));
            }
        }
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_pipeline_domain::entities::ImageResult;
    use ocr_pipeline_domain::error::PipelineError;
    use ocr_pipeline_domain::value_objects::Rotation;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn sample_result() -> BatchResult {
        let image = ImageResult {
            width: 10,
            height: 10,
            regions: vec![],
            avg_det_conf: 0.0,
            applied_rotation: Rotation::None,
            orient_conf: 0.0,
            timings: Default::default(),
            total_ns: 0,
        };
        let mut errors = HashMap::new();
        errors.insert(PathBuf::from("bad.ppm"), PipelineError::Io("boom".into()));
        BatchResult {
            results: vec![Some(image), None],
            errors,
            stats: BatchStats::new(2, 1, 1, 1, std::time::Duration::from_millis(5)),
            cancelled: false,
        }
    }

    #[test]
    fn text_render_includes_error_section() {
        let rendered = render_text(&sample_result());
        assert!(rendered.contains("[0]"));
        assert!(rendered.contains("errors:"));
    }

    #[test]
    fn json_render_is_valid_json() {
        let rendered = render_json(&sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert!(value.get("stats").is_some());
    }

    #[test]
    fn csv_render_has_a_header_and_one_row_per_result() {
        let rendered = render_csv(&sample_result());
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("index,"));
    }

    #[test]
    fn csv_escape_quotes_fields_containing_commas() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("plain"), "plain");
    }
}
