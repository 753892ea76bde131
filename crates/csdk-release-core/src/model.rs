//! Release model: components, the umbrella repository, and what a release
//! candidate is verified against.
//!
//! A [`ReleasePlan`] is built once per run from validated configuration and
//! is immutable for the rest of the run.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifies a hosted repository (e.g. `FreeRTOS/coreMQTT`).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RepoLocation {
    /// Canonical `owner/name` slug on the version-control host.
    pub slug: String,
    /// Checkout of this repository under the umbrella root, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl RepoLocation {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            local_path: None,
        }
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

impl fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}

/// A named SDK library with its operator-declared release version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Unique key, e.g. `coremqtt`.
    pub name: String,
    /// Version the operator expects the manifest to declare, e.g. `v1.0.1`.
    pub expected_version: String,
    pub repository: RepoLocation,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        expected_version: impl Into<String>,
        repository: RepoLocation,
    ) -> Self {
        Self {
            name: name.into(),
            expected_version: expected_version.into(),
            repository,
        }
    }
}

/// Set of branch names observed in a repository at check time.
pub type BranchSet = BTreeSet<String>;

/// Commit identifier as reported by the version-control host.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal status of a CI job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pass,
    Fail,
    Unknown,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pass => "pass",
            JobStatus::Fail => "fail",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Identifies a CI job.
///
/// Jobs bound to a repository are resolved against a commit of that
/// repository; unbound jobs are pipeline jobs resolved against a build
/// selector such as `lastCompletedBuild`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepoLocation>,
}

impl JobRef {
    pub fn pipeline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository: None,
        }
    }

    pub fn for_repository(name: impl Into<String>, repository: RepoLocation) -> Self {
        Self {
            name: name.into(),
            repository: Some(repository),
        }
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repository {
            Some(repo) => write!(f, "{}@{}", self.name, repo.slug),
            None => f.write_str(&self.name),
        }
    }
}

/// A component entry declared in the umbrella manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    /// Repository URL as written in the manifest, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

/// The umbrella manifest: its own version plus ordered component entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub dependencies: Vec<ManifestEntry>,
}

impl Manifest {
    /// Entries whose name matches `component` ignoring case.
    pub fn entries_for(&self, component: &str) -> Vec<&ManifestEntry> {
        self.dependencies
            .iter()
            .filter(|dep| dep.name.eq_ignore_ascii_case(component))
            .collect()
    }
}

/// An open pull request against a repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

/// The umbrella repository that aggregates all components via its manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Umbrella {
    /// Subject name used in findings, e.g. `aws-iot-device-sdk-embedded-c`.
    pub name: String,
    /// Version the manifest must declare for the umbrella itself.
    pub expected_version: String,
    pub repository: RepoLocation,
    /// Path of the manifest file, relative to [`ReleasePlan::root`].
    pub manifest_path: PathBuf,
    /// Exact branch set the umbrella repository must have.
    pub allowed_branches: BranchSet,
    /// Branch release candidates are staged on; open PRs into it block release.
    pub release_branch: String,
    /// Pipeline jobs whose latest run must pass.
    pub pipeline_jobs: Vec<JobRef>,
    /// Build selector passed to the CI provider for pipeline jobs.
    pub pipeline_revision: String,
}

/// Everything a verification run checks, built once from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasePlan {
    /// Filesystem root of the umbrella checkout.
    pub root: PathBuf,
    pub umbrella: Umbrella,
    pub components: Vec<Component>,
    /// Exact branch set every library repository must have.
    pub library_branches: BranchSet,
    /// Branch of each library whose latest commit is the release candidate.
    pub candidate_branch: String,
    /// Per-library CI jobs (unit tests, code quality) that must pass.
    pub quality_jobs: Vec<String>,
}

impl ReleasePlan {
    /// Branch set `{master}` required of library repositories.
    pub fn default_library_branches() -> BranchSet {
        ["master"].into_iter().map(String::from).collect()
    }

    /// Branch set `{master, v4_beta_deprecated}` required of the umbrella.
    pub fn default_umbrella_branches() -> BranchSet {
        ["master", "v4_beta_deprecated"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// The subject one unit of check evaluation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Umbrella,
    Component(Component),
}

impl Target {
    /// Name used as the finding subject.
    pub fn subject<'a>(&'a self, plan: &'a ReleasePlan) -> &'a str {
        match self {
            Target::Umbrella => &plan.umbrella.name,
            Target::Component(c) => &c.name,
        }
    }

    pub fn repository<'a>(&'a self, plan: &'a ReleasePlan) -> &'a RepoLocation {
        match self {
            Target::Umbrella => &plan.umbrella.repository,
            Target::Component(c) => &c.repository,
        }
    }
}
