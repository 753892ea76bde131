//! CSDK release verification engine.
//!
//! Decides whether a release candidate of the umbrella SDK repository and its
//! component libraries may proceed:
//!
//! - [`checks`]: the individual verification checks
//! - [`runner::CheckRunner`]: runs a [`runner::CheckRegistry`] against a
//!   [`model::ReleasePlan`], isolating per-target failures
//! - [`aggregator::aggregate`]: ordered findings plus the pass/fail verdict
//! - [`report`]: `error.log` and `docs_to_review.txt`
//!
//! External systems are reached only through the traits in [`provider`].

pub mod aggregator;
pub mod checks;
pub mod error;
pub mod fakes;
pub mod finding;
pub mod model;
pub mod obs;
pub mod provider;
pub mod redact;
pub mod report;
pub mod runner;
pub mod telemetry;

pub use aggregator::{aggregate, Aggregate};
pub use checks::{Check, CheckContext};
pub use error::{ProviderError, ProviderResult, VerifyError, VerifyResult};
pub use finding::{Category, Finding, Severity, Verdict};
pub use model::{
    BranchSet, CommitId, Component, JobRef, JobStatus, Manifest, ManifestEntry, PullRequest,
    ReleasePlan, RepoLocation, Target, Umbrella,
};
pub use obs::VerifySpan;
pub use provider::{CiProvider, DocumentLocator, ManifestProvider, Providers, VersionControlProvider};
pub use report::{
    render_docs_to_review, render_error_log, write_reports, write_run_summary_json, ReportPaths,
    RunSummaryArtifact,
};
pub use runner::{CheckRegistry, CheckRunner, RunnerConfig};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
