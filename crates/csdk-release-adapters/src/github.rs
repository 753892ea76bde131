//! GitHub REST adapter.
//!
//! Serves branches, head commits, pinned submodule commits and open pull
//! requests, and reports the
//! status of per-repository quality jobs from check runs. The pseudo job
//! [`COMBINED_STATUS_JOB`] reads the combined commit status instead, which is
//! where externally hosted jobs (e.g. CBMC proofs) report.

use std::path::{Component, Path};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use csdk_release_core::{
    BranchSet, CiProvider, CommitId, JobRef, JobStatus, ProviderError, ProviderResult,
    PullRequest, RepoLocation, VersionControlProvider,
};
use regex::Regex;
use reqwest::RequestBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::http::{build_client, decode, transport_error};
use crate::secret::Secret;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Job name that resolves to the combined commit status.
pub const COMBINED_STATUS_JOB: &str = "combined-status";

const SYSTEM: &str = "github";
const PAGE_SIZE: usize = 100;

/// Connection settings for the GitHub API.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub token: Secret,
    pub timeout: Duration,
}

impl GithubConfig {
    pub fn new(token: Secret) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> ProviderResult<Self> {
        let http = build_client(config.timeout, true)?;
        Ok(Self { http, config })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{}", self.config.api_url, path))
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", self.config.token.expose()))
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(
        &self,
        what: &str,
        request: RequestBuilder,
    ) -> ProviderResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(SYSTEM, e, self.config.timeout))?;
        decode(what, response).await
    }

    async fn check_run_status(&self, repo: &RepoLocation, name: &str, sha: &str) -> ProviderResult<JobStatus> {
        let what = format!("check runs for {repo} at {sha}");
        let body: CheckRunList = self
            .fetch(
                &what,
                self.get(&format!("/repos/{}/commits/{}/check-runs", repo.slug, sha))
                    .query(&[("check_name", name), ("filter", "latest")]),
            )
            .await?;
        Ok(check_runs_status(&body.check_runs))
    }

    async fn combined_status(&self, repo: &RepoLocation, sha: &str) -> ProviderResult<JobStatus> {
        let what = format!("combined status for {repo} at {sha}");
        let body: CombinedStatus = self
            .fetch(&what, self.get(&format!("/repos/{}/commits/{}/status", repo.slug, sha)))
            .await?;
        Ok(combined_state_status(&body.state))
    }
}

#[async_trait]
impl VersionControlProvider for GithubClient {
    async fn list_branches(&self, repo: &RepoLocation) -> ProviderResult<BranchSet> {
        let what = format!("branches of {repo}");
        let mut branches = BranchSet::new();
        for page in 1.. {
            let batch: Vec<NamedRef> = self
                .fetch(
                    &what,
                    self.get(&format!("/repos/{}/branches", repo.slug))
                        .query(&[("per_page", PAGE_SIZE), ("page", page)]),
                )
                .await?;
            let len = batch.len();
            branches.extend(batch.into_iter().map(|b| b.name));
            if len < PAGE_SIZE {
                break;
            }
        }
        debug!(repository = %repo, count = branches.len(), "listed branches");
        Ok(branches)
    }

    async fn latest_commit(&self, repo: &RepoLocation, branch: &str) -> ProviderResult<CommitId> {
        let what = format!("branch {branch} of {repo}");
        let commit: CommitRef = self
            .fetch(&what, self.get(&format!("/repos/{}/commits/{}", repo.slug, branch)))
            .await?;
        Ok(CommitId(commit.sha))
    }

    async fn pinned_submodule(
        &self,
        repo: &RepoLocation,
        path: &Path,
        git_ref: &str,
    ) -> ProviderResult<CommitId> {
        let path = api_path(path);
        let what = format!("submodule {path} on {git_ref} of {repo}");
        let entry: ContentEntry = self
            .fetch(
                &what,
                self.get(&format!("/repos/{}/contents/{}", repo.slug, path))
                    .query(&[("ref", git_ref)]),
            )
            .await?;
        if entry.kind != "submodule" {
            return Err(ProviderError::Malformed(format!(
                "{what} is a {}, not a submodule",
                entry.kind
            )));
        }
        Ok(CommitId(entry.sha))
    }

    async fn open_pull_requests(&self, repo: &RepoLocation, base: &str) -> ProviderResult<Vec<PullRequest>> {
        let what = format!("pull requests into {base} of {repo}");
        let mut pulls = Vec::new();
        for page in 1.. {
            let batch: Vec<PullRef> = self
                .fetch(
                    &what,
                    self.get(&format!("/repos/{}/pulls", repo.slug)).query(&[
                        ("state", "open".to_string()),
                        ("base", base.to_string()),
                        ("per_page", PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ]),
                )
                .await?;
            let len = batch.len();
            pulls.extend(batch.into_iter().map(|p| PullRequest {
                number: p.number,
                url: p.html_url,
            }));
            if len < PAGE_SIZE {
                break;
            }
        }
        Ok(pulls)
    }

    async fn probe(&self) -> ProviderResult<()> {
        let response = self
            .get("/rate_limit")
            .send()
            .await
            .map_err(|e| transport_error(SYSTEM, e, self.config.timeout))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable {
                system: SYSTEM.to_string(),
                detail: format!("API answered HTTP {status}"),
            })
        }
    }
}

/// Quality jobs live on GitHub; only repository-scoped jobs are served.
#[async_trait]
impl CiProvider for GithubClient {
    async fn job_status(&self, job: &JobRef, revision: &str) -> ProviderResult<JobStatus> {
        let Some(repo) = job.repository.as_ref() else {
            return Err(ProviderError::NotFound(format!(
                "job {job} is not bound to a repository"
            )));
        };
        if job.name == COMBINED_STATUS_JOB {
            self.combined_status(repo, revision).await
        } else {
            self.check_run_status(repo, &job.name, revision).await
        }
    }

    async fn probe(&self) -> ProviderResult<()> {
        VersionControlProvider::probe(self).await
    }
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullRef {
    number: u64,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct CheckRunList {
    #[serde(default)]
    check_runs: Vec<CheckRun>,
}

/// One GitHub check run.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRun {
    pub status: String,
    pub conclusion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CombinedStatus {
    state: String,
}

/// Status of one check run.
pub fn check_run_status(run: &CheckRun) -> JobStatus {
    if run.status != "completed" {
        return JobStatus::Unknown;
    }
    match run.conclusion.as_deref() {
        Some("success") | Some("neutral") | Some("skipped") => JobStatus::Pass,
        Some("failure") | Some("timed_out") | Some("cancelled") | Some("action_required")
        | Some("startup_failure") => JobStatus::Fail,
        _ => JobStatus::Unknown,
    }
}

/// Status of a job from all its check runs at one commit.
///
/// Any failing run fails the job. No runs, or any run still pending, is
/// unknown.
pub fn check_runs_status(runs: &[CheckRun]) -> JobStatus {
    if runs.is_empty() {
        return JobStatus::Unknown;
    }
    let statuses: Vec<JobStatus> = runs.iter().map(check_run_status).collect();
    if statuses.contains(&JobStatus::Fail) {
        JobStatus::Fail
    } else if statuses.contains(&JobStatus::Unknown) {
        JobStatus::Unknown
    } else {
        JobStatus::Pass
    }
}

/// Status from a combined commit status state.
pub fn combined_state_status(state: &str) -> JobStatus {
    match state {
        "success" => JobStatus::Pass,
        "failure" | "error" => JobStatus::Fail,
        _ => JobStatus::Unknown,
    }
}

/// Repository-relative path with `/` separators.
fn api_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn slug_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)^(?:https?://|git@)(?:[^@/]+@)?github\.com[/:]([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
                .ok()
        })
        .as_ref()
}

/// `owner/name` slug of a GitHub clone or web URL.
pub fn repo_slug_from_url(url: &str) -> Option<String> {
    let caps = slug_pattern()?.captures(url.trim())?;
    Some(format!("{}/{}", &caps[1], &caps[2]))
}
