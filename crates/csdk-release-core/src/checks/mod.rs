//! Verification checks.
//!
//! Every check implements [`Check`]: it names the targets it covers and
//! evaluates one target at a time into a batch of findings. Checks never
//! share state and never look at each other's results, so the runner may
//! evaluate targets in any order or concurrently.

pub mod branch_policy;
pub mod ci_pipeline;
pub mod doc_review;
pub mod manifest_version;
pub mod pull_requests;
pub mod tests_quality;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::finding::{Category, Finding};
use crate::model::{BranchSet, CommitId, JobRef, JobStatus, Manifest, PullRequest, ReleasePlan, RepoLocation, Target};
use crate::provider::Providers;
use crate::redact::redact;

pub use branch_policy::BranchPolicyCheck;
pub use ci_pipeline::CiPipelineCheck;
pub use doc_review::DocReviewCheck;
pub use manifest_version::ManifestVersionCheck;
pub use pull_requests::PullRequestCheck;
pub use tests_quality::TestsAndQualityCheck;

/// One independently addable verification check.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable name used in logs and unit-failure findings.
    fn name(&self) -> &'static str;

    /// Category every finding of this check is filed under.
    fn category(&self) -> Category;

    /// Targets this check evaluates, in presentation order.
    fn targets(&self, plan: &ReleasePlan) -> Vec<Target>;

    /// Evaluate a single target.
    ///
    /// An `Err` means the target could not be evaluated at all; the runner
    /// files it as an error finding for this check and target.
    async fn evaluate(&self, ctx: &CheckContext, target: &Target) -> ProviderResult<Vec<Finding>>;
}

/// Read-only inputs shared by all check evaluations of a run.
///
/// Every provider call made through the context is bounded by the run's
/// call timeout.
#[derive(Clone)]
pub struct CheckContext {
    plan: Arc<ReleasePlan>,
    manifest: Arc<Manifest>,
    providers: Providers,
    call_timeout: Duration,
    secrets: Arc<Vec<String>>,
}

impl CheckContext {
    pub fn new(
        plan: Arc<ReleasePlan>,
        manifest: Arc<Manifest>,
        providers: Providers,
        call_timeout: Duration,
        secrets: Arc<Vec<String>>,
    ) -> Self {
        Self {
            plan,
            manifest,
            providers,
            call_timeout,
            secrets,
        }
    }

    pub fn plan(&self) -> &ReleasePlan {
        &self.plan
    }

    /// Manifest read once at the start of the run.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub async fn list_branches(&self, repo: &RepoLocation) -> ProviderResult<BranchSet> {
        self.bounded(self.providers.vcs.list_branches(repo)).await
    }

    pub async fn latest_commit(&self, repo: &RepoLocation, branch: &str) -> ProviderResult<CommitId> {
        self.bounded(self.providers.vcs.latest_commit(repo, branch))
            .await
    }

    pub async fn pinned_submodule(
        &self,
        repo: &RepoLocation,
        path: &Path,
        git_ref: &str,
    ) -> ProviderResult<CommitId> {
        self.bounded(self.providers.vcs.pinned_submodule(repo, path, git_ref))
            .await
    }

    pub async fn open_pull_requests(
        &self,
        repo: &RepoLocation,
        base: &str,
    ) -> ProviderResult<Vec<PullRequest>> {
        self.bounded(self.providers.vcs.open_pull_requests(repo, base))
            .await
    }

    pub async fn job_status(&self, job: &JobRef, revision: &str) -> ProviderResult<JobStatus> {
        self.bounded(self.providers.ci.job_status(job, revision))
            .await
    }

    pub async fn locate_documents(&self, dir: &Path, file_names: &[&str]) -> ProviderResult<Vec<PathBuf>> {
        self.bounded(self.providers.docs.locate(dir, file_names))
            .await
    }

    /// Provider error text with credentials removed, safe for findings.
    pub fn describe_error(&self, err: &ProviderError) -> String {
        let secrets: Vec<&str> = self.secrets.iter().map(String::as_str).collect();
        redact(&err.to_string(), &secrets)
    }

    async fn bounded<T, F>(&self, call: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
        }
    }
}

/// Render a CI job status into an error finding message, or `None` on pass.
///
/// Timeouts count as `unknown`.
pub(crate) fn job_status_problem(
    job: &str,
    scope: &str,
    outcome: &ProviderResult<JobStatus>,
    ctx: &CheckContext,
) -> Option<String> {
    match outcome {
        Ok(JobStatus::Pass) => None,
        Ok(JobStatus::Fail) => Some(format!("job {job} failed for {scope}")),
        Ok(JobStatus::Unknown) => Some(format!("job {job} has unknown status for {scope}")),
        Err(ProviderError::Timeout(after)) => Some(format!(
            "job {job} has unknown status for {scope} (status query timed out after {}s)",
            after.as_secs_f64()
        )),
        Err(e) => Some(format!(
            "job {job} has unknown status for {scope}: {}",
            ctx.describe_error(e)
        )),
    }
}
