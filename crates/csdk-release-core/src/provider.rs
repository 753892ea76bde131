//! Provider seams the verification engine reads through.
//!
//! Implement these traits to plug in real hosts (see the adapters crate) or
//! test doubles (see [`crate::fakes`]). Providers are read-only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::model::{BranchSet, CommitId, JobRef, JobStatus, Manifest, PullRequest, RepoLocation};

/// Version-control host: branches, commits and pull requests of a repository.
#[async_trait]
pub trait VersionControlProvider: Send + Sync {
    /// Names of all branches currently in `repo`.
    async fn list_branches(&self, repo: &RepoLocation) -> ProviderResult<BranchSet>;

    /// Head commit of `branch` in `repo`.
    async fn latest_commit(&self, repo: &RepoLocation, branch: &str) -> ProviderResult<CommitId>;

    /// Commit of the submodule at `path` recorded in `repo` at `git_ref`.
    ///
    /// `NotFound` when the ref does not exist or nothing is pinned at `path`.
    async fn pinned_submodule(
        &self,
        repo: &RepoLocation,
        path: &Path,
        git_ref: &str,
    ) -> ProviderResult<CommitId>;

    /// Open pull requests targeting `base` in `repo`.
    async fn open_pull_requests(
        &self,
        repo: &RepoLocation,
        base: &str,
    ) -> ProviderResult<Vec<PullRequest>>;

    /// Cheap reachability probe run once before any check.
    async fn probe(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// CI system: terminal status of a job at a commit or build selector.
#[async_trait]
pub trait CiProvider: Send + Sync {
    async fn job_status(&self, job: &JobRef, revision: &str) -> ProviderResult<JobStatus>;

    async fn probe(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Reads the umbrella manifest.
#[async_trait]
pub trait ManifestProvider: Send + Sync {
    async fn read_manifest(&self, path: &Path) -> ProviderResult<Manifest>;
}

/// Finds documentation files under a directory.
#[async_trait]
pub trait DocumentLocator: Send + Sync {
    /// Paths of every file under `dir` whose file name is one of `file_names`.
    async fn locate(&self, dir: &Path, file_names: &[&str]) -> ProviderResult<Vec<PathBuf>>;
}

/// The set of providers a run reads through.
#[derive(Clone)]
pub struct Providers {
    pub vcs: Arc<dyn VersionControlProvider>,
    pub ci: Arc<dyn CiProvider>,
    pub manifest: Arc<dyn ManifestProvider>,
    pub docs: Arc<dyn DocumentLocator>,
}

impl Providers {
    pub fn new(
        vcs: Arc<dyn VersionControlProvider>,
        ci: Arc<dyn CiProvider>,
        manifest: Arc<dyn ManifestProvider>,
        docs: Arc<dyn DocumentLocator>,
    ) -> Self {
        Self {
            vcs,
            ci,
            manifest,
            docs,
        }
    }
}
