//! Wrapping reports written in strict mode.
//!
//! When `CACHE_AUTOGEN_PATH` is set and strict mode is on, every wrapped
//! service leaves a JSON description of its cached methods under
//! `<path>/CachedClass/Cache_<Name>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::validator::{MethodTable, ValidationMode};

/// Directory under the autogen path holding the reports.
pub const REPORT_DIR: &str = "CachedClass";

#[derive(Debug, Serialize)]
pub struct WrappingReport<'a> {
    pub class: &'a str,
    pub cache_version: &'a str,
    pub mode: String,
    pub generated_at: DateTime<Utc>,
    pub cached: Vec<ReportedMethod>,
    pub passthrough: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ReportedMethod {
    pub method: String,
    pub key_prefix: String,
    pub ttl_seconds: u64,
    pub returns: String,
    /// `name: type (policy)` per parameter.
    pub params: Vec<String>,
}

impl<'a> WrappingReport<'a> {
    pub fn new(
        class: &'a str,
        cache_version: &'a str,
        mode: ValidationMode,
        table: &MethodTable,
    ) -> Self {
        let cached = table
            .descriptors()
            .into_iter()
            .map(|descriptor| ReportedMethod {
                method: descriptor.identity.to_string(),
                key_prefix: descriptor.key_prefix().to_string(),
                ttl_seconds: descriptor.ttl_seconds,
                returns: descriptor.return_type.to_string(),
                params: descriptor
                    .param_names
                    .iter()
                    .zip(&descriptor.identity.param_types)
                    .zip(&descriptor.policies)
                    .map(|((name, ty), policy)| format!("{name}: {ty} ({policy})"))
                    .collect(),
            })
            .collect();

        Self {
            class,
            cache_version,
            mode: mode.to_string(),
            generated_at: Utc::now(),
            cached,
            passthrough: table.passthrough_methods(),
        }
    }
}

/// Path of the report for `class` under `root`.
pub fn report_path(root: &Path, class: &str) -> PathBuf {
    root.join(REPORT_DIR).join(format!("Cache_{class}.json"))
}

/// Writes the report and returns its path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn write_report(root: &Path, report: &WrappingReport<'_>) -> Result<PathBuf> {
    let path = report_path(root, report.class);
    let dir = root.join(REPORT_DIR);

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;

    let body = serde_json::to_vec_pretty(report).context("Failed to serialize wrapping report")?;
    fs::write(&path, body)
        .with_context(|| format!("Failed to write wrapping report {}", path.display()))?;

    Ok(path)
}
