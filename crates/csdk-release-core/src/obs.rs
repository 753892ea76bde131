//! Structured observability hooks for verification runs.
//!
//! Events are emitted through `tracing`; the subscriber (plain or JSON) is
//! configured by [`crate::telemetry::init_tracing`]. Event fields never carry
//! credentials: failure reasons are redacted before they get here.

use std::time::Duration;

use tracing::{info, warn};

use crate::finding::Verdict;

/// RAII guard that enters a run-scoped span for the duration of a run.
///
/// ```ignore
/// let _span = VerifySpan::enter("2f1c...");
/// // every event below carries run_id
/// ```
pub struct VerifySpan {
    _span: tracing::span::EnteredSpan,
}

impl VerifySpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("csdk_release.verify", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_verify_started(umbrella: &str, components: usize, checks: usize) {
    info!(
        event = "verify.started",
        umbrella = %umbrella,
        components = components,
        checks = checks,
    );
}

pub fn emit_check_completed(check: &str, subject: &str, findings: usize, elapsed: Duration) {
    info!(
        event = "check.completed",
        check = %check,
        subject = %subject,
        findings = findings,
        duration_ms = elapsed.as_millis() as u64,
    );
}

/// A check could not evaluate one subject; it is reported as a finding.
pub fn emit_check_unit_failed(check: &str, subject: &str, reason: &str) {
    warn!(event = "check.unit_failed", check = %check, subject = %subject, reason = %reason);
}

pub fn emit_verify_finished(verdict: Verdict, errors: usize, review_items: usize, elapsed: Duration) {
    info!(
        event = "verify.finished",
        verdict = %verdict,
        errors = errors,
        review_items = review_items,
        duration_ms = elapsed.as_millis() as u64,
    );
}

pub fn emit_reports_written(error_log: Option<&std::path::Path>, docs_to_review: &std::path::Path) {
    info!(
        event = "reports.written",
        error_log = ?error_log,
        docs_to_review = %docs_to_review.display(),
    );
}
