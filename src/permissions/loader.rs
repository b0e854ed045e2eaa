//! Loading of policy documents from disk.
//!
//! Every `<container>.<extension>` file below a directory becomes one
//! [`PolicyClass`](super::PolicyClass) named after the file stem.
//! Subdirectories are searched as well. A document that cannot be read or
//! parsed is reported and skipped; the rest still load.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{parse_policy, PolicySet};
use crate::error::{GateError, Result};

/// Result of loading a policy directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub policies: PolicySet,
    /// Documents that were skipped, with the reason.
    pub failures: Vec<(PathBuf, GateError)>,
    /// Number of candidate documents found.
    pub total: usize,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.total - self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads every policy document under `dir` with the given file extension.
///
/// A missing directory yields an empty set. Failing to list `dir` itself is an
/// error; unreadable subdirectories are skipped with a warning and failures of
/// single documents are collected in the report. Documents load in path order,
/// so of two files with the same stem the later one wins.
pub fn load_policy_dir(dir: &Path, extension: &str) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    if !dir.exists() {
        info!(dir = %dir.display(), "Permission directory not found, no policies loaded");
        return Ok(report);
    }

    let mut paths = Vec::new();
    collect_documents(dir, extension, &mut paths)?;
    paths.sort();

    report.total = paths.len();
    for path in paths {
        match load_document(&path) {
            Ok(class) => {
                if report.policies.get(&class.name).is_some() {
                    warn!(path = %path.display(), class = %class.name, "Permission file replaces an earlier one");
                }
                report.policies.insert(class);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping permission file");
                report.failures.push((path, err));
            }
        }
    }

    info!(
        "Parsed {}/{} permission files",
        report.loaded(),
        report.total
    );

    Ok(report)
}

fn collect_documents(dir: &Path, extension: &str, paths: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| GateError::io(dir, e))?;

    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        // file_type does not follow symlinks, so linked directories are not walked
        let is_dir = entry.file_type().is_ok_and(|ty| ty.is_dir());

        if is_dir {
            if let Err(err) = collect_documents(&path, extension, paths) {
                warn!(dir = %path.display(), error = %err, "Skipping permission subdirectory");
            }
        } else if path.is_file() && has_extension(&path, extension) {
            paths.push(path);
        }
    }

    Ok(())
}

fn load_document(path: &Path) -> Result<super::PolicyClass> {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| GateError::config(format!("Invalid policy file name: {}", path.display())))?;
    let source = std::fs::read_to_string(path).map_err(|e| GateError::io(path, e))?;

    parse_policy(name, &source).map_err(|e| GateError::policy(name, e))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
