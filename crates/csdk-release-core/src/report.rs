//! Report emission: `error.log`, `docs_to_review.txt`, and an optional JSON
//! run summary.
//!
//! Rendering is pure; the `write_*` functions are the only file I/O the
//! engine performs. Reports are only written for completed runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregate;
use crate::finding::{Finding, Verdict};
use crate::obs;

pub const ERROR_LOG: &str = "error.log";
pub const DOCS_TO_REVIEW: &str = "docs_to_review.txt";
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";

/// One `<category>: <subject>: <message>` line per error finding.
pub fn render_error_log(aggregate: &Aggregate) -> String {
    let mut out = String::new();
    for finding in aggregate.errors() {
        out.push_str(&finding.to_string());
        out.push('\n');
    }
    out
}

/// One line per reviewed document path, sorted and deduplicated.
pub fn render_docs_to_review(aggregate: &Aggregate) -> String {
    let paths: BTreeSet<&str> = aggregate
        .review_items()
        .map(|f| f.message.as_str())
        .collect();
    let mut out = String::new();
    for path in paths {
        out.push_str(path);
        out.push('\n');
    }
    out
}

/// Where the reports of a run were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// `None` when the run had no errors and no `error.log` exists.
    pub error_log: Option<PathBuf>,
    pub docs_to_review: PathBuf,
}

/// Write both reports into `dir`, replacing any previous run's files.
///
/// `error.log` exists afterwards only if the run produced errors.
pub fn write_reports(dir: &Path, aggregate: &Aggregate) -> Result<ReportPaths> {
    let error_log = dir.join(ERROR_LOG);
    let docs_to_review = dir.join(DOCS_TO_REVIEW);

    let error_log = if aggregate.error_count() > 0 {
        std::fs::write(&error_log, render_error_log(aggregate))
            .with_context(|| format!("write {:?}", error_log))?;
        Some(error_log)
    } else {
        match std::fs::remove_file(&error_log) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("remove stale {:?}", error_log)),
        }
        None
    };

    std::fs::write(&docs_to_review, render_docs_to_review(aggregate))
        .with_context(|| format!("write {:?}", docs_to_review))?;

    obs::emit_reports_written(error_log.as_deref(), &docs_to_review);
    Ok(ReportPaths {
        error_log,
        docs_to_review,
    })
}

/// Machine-readable summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummaryArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub verdict: Verdict,
    pub error_count: usize,
    pub review_item_count: usize,
    /// Error counts keyed by category name.
    pub errors_by_category: BTreeMap<String, usize>,
    pub findings: Vec<Finding>,
}

impl RunSummaryArtifact {
    pub fn new(run_id: impl Into<String>, generated_at: DateTime<Utc>, aggregate: &Aggregate) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            generated_at,
            run_id: run_id.into(),
            verdict: aggregate.verdict,
            error_count: aggregate.error_count(),
            review_item_count: aggregate.review_item_count(),
            errors_by_category: aggregate
                .errors_by_category()
                .into_iter()
                .map(|(category, count)| (category.as_str().to_string(), count))
                .collect(),
            findings: aggregate.findings.clone(),
        }
    }
}

/// Write the run summary in pretty JSON format.
pub fn write_run_summary_json(path: &Path, artifact: &RunSummaryArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize run summary")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
