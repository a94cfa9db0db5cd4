// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Discovery (§4.6)
//!
//! Resolves the Batch Façade's `inputs` list — a mix of individual files and
//! directories — into the flat, ordered file list the scheduler consumes.
//! Directories are walked breadth-first rather than depth-first: a shallow
//! `recursive = false` run should see every file directly inside a given
//! directory before this module has any reason to look further down, and
//! the breadth-first queue makes that the natural order instead of an
//! accident of how deep the first subdirectory happens to go.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use ocr_pipeline_domain::error::PipelineError;
use ocr_pipeline_domain::value_objects::FileDiscoveryConfig;

/// Walks `inputs` in order, expanding any directory per `config` and
/// passing individual files through unchanged — an input named explicitly
/// by the caller is never filtered by `include`/`exclude`, only files
/// discovered underneath a directory input are.
pub fn discover(inputs: &[PathBuf], config: &FileDiscoveryConfig) -> Result<Vec<PathBuf>, PipelineError> {
    let include = compile_patterns(&config.include)?;
    let exclude = compile_patterns(&config.exclude)?;

    let mut discovered = Vec::new();
    for input in inputs {
        let metadata = fs::metadata(input).map_err(|e| PipelineError::Io(format!("{}: {e}", input.display())))?;
        if metadata.is_dir() {
            walk_directory(input, config.recursive, &include, &exclude, &mut discovered)?;
        } else {
            discovered.push(input.clone());
        }
    }
    Ok(discovered)
}

fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>, PipelineError> {
    raw.iter()
        .map(|p| Pattern::new(p).map_err(|e| PipelineError::Config(format!("invalid glob pattern '{p}': {e}"))))
        .collect()
}

/// Breadth-first queue of directories still to visit; `recursive = false`
/// enqueues nothing beyond the root, so only `root`'s direct children are
/// ever read.
fn walk_directory(
    root: &Path,
    recursive: bool,
    include: &[Pattern],
    exclude: &[Pattern],
    out: &mut Vec<PathBuf>,
) -> Result<(), PipelineError> {
    let mut queue = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        let entries = fs::read_dir(&dir).map_err(|e| PipelineError::Io(format!("{}: {e}", dir.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::Io(format!("{}: {e}", dir.display())))?;
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                if recursive {
                    queue.push_back(path);
                }
            } else if is_selected(&path, include, exclude) {
                out.push(path);
            }
        }
    }
    Ok(())
}

/// A file is selected iff it matches at least one include pattern and no
/// exclude pattern (§4.6). Patterns are matched against the file name, not
/// the full path, so `*.png` behaves the way an operator expects regardless
/// of how deep the file was found.
fn is_selected(path: &Path, include: &[Pattern], exclude: &[Pattern]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let included = include.iter().any(|p| p.matches(name));
    let excluded = exclude.iter().any(|p| p.matches(name));
    included && !excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ocr-pipeline-discovery-test-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn explicit_file_input_bypasses_include_exclude() {
        let dir = temp_dir("explicit-file");
        let file = dir.join("note.txt");
        File::create(&file).unwrap();

        let config = FileDiscoveryConfig { recursive: false, include: vec!["*.png".into()], exclude: vec![] };
        let found = discover(&[file.clone()], &config).unwrap();
        assert_eq!(found, vec![file]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn non_recursive_discovery_ignores_nested_directories() {
        let dir = temp_dir("non-recursive");
        File::create(dir.join("a.png")).unwrap();
        let nested = dir.join("nested");
        fs::create_dir(&nested).unwrap();
        File::create(nested.join("b.png")).unwrap();

        let config = FileDiscoveryConfig { recursive: false, include: vec!["*.png".into()], exclude: vec![] };
        let found = discover(&[dir.clone()], &config).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_name().unwrap(), "a.png");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn recursive_discovery_walks_subdirectories_breadth_first() {
        let dir = temp_dir("recursive");
        File::create(dir.join("a.png")).unwrap();
        let nested = dir.join("nested");
        fs::create_dir(&nested).unwrap();
        File::create(nested.join("b.png")).unwrap();

        let config = FileDiscoveryConfig { recursive: true, include: vec!["*.png".into()], exclude: vec![] };
        let found = discover(&[dir.clone()], &config).unwrap();
        assert_eq!(found.len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn exclude_pattern_wins_over_a_matching_include() {
        let dir = temp_dir("exclude-wins");
        File::create(dir.join("keep.png")).unwrap();
        File::create(dir.join("skip.png")).unwrap();

        let config =
            FileDiscoveryConfig { recursive: false, include: vec!["*.png".into()], exclude: vec!["skip.*".into()] };
        let found = discover(&[dir.clone()], &config).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_name().unwrap(), "keep.png");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let missing = PathBuf::from("/nonexistent/ocr-pipeline-discovery-missing");
        let config = FileDiscoveryConfig::default();
        assert!(discover(&[missing], &config).is_err());
    }
}
