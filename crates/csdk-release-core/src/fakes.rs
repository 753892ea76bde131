//! In-memory providers and a fixture release plan (testing only).
//!
//! Every fake is built up front and read-only afterwards. Failures and
//! delays are injected per repository or per job so isolation and timeout
//! behaviour can be exercised without a network.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::checks::CheckContext;
use crate::error::{ProviderError, ProviderResult};
use crate::model::{
    BranchSet, CommitId, Component, JobRef, JobStatus, Manifest, ManifestEntry, PullRequest,
    ReleasePlan, RepoLocation, Umbrella,
};
use crate::provider::{CiProvider, DocumentLocator, ManifestProvider, Providers, VersionControlProvider};

pub const UMBRELLA_SLUG: &str = "aws/aws-iot-device-sdk-embedded-c";

/// (component, manifest name, slug, local path, version)
const FIXTURE_COMPONENTS: [(&str, &str, &str, &str, &str); 3] = [
    ("coremqtt", "coreMQTT", "FreeRTOS/coreMQTT", "libraries/standard/coreMQTT", "v1.0.1"),
    ("corejson", "coreJSON", "FreeRTOS/coreJSON", "libraries/standard/coreJSON", "v2.0.0"),
    (
        "device-shadow",
        "Device-Shadow",
        "aws/Device-Shadow-for-AWS-IoT-embedded-sdk",
        "libraries/aws/device-shadow-for-aws-iot-embedded-sdk",
        "v1.0.2",
    ),
];

/// A three-library release plan rooted at `/csdk`.
pub fn fixture_plan() -> ReleasePlan {
    ReleasePlan {
        root: PathBuf::from("/csdk"),
        umbrella: Umbrella {
            name: "aws-iot-device-sdk-embedded-c".to_string(),
            expected_version: "202012.00".to_string(),
            repository: RepoLocation::new(UMBRELLA_SLUG),
            manifest_path: PathBuf::from("manifest.yml"),
            allowed_branches: ReleasePlan::default_umbrella_branches(),
            release_branch: "release-candidate".to_string(),
            pipeline_jobs: vec![
                JobRef::pipeline("job/csdk/job/demo_pipeline"),
                JobRef::pipeline("job/csdk/job/nightly"),
            ],
            pipeline_revision: "lastCompletedBuild".to_string(),
        },
        components: FIXTURE_COMPONENTS
            .iter()
            .map(|(name, _, slug, local, version)| {
                Component::new(*name, *version, RepoLocation::new(*slug).with_local_path(*local))
            })
            .collect(),
        library_branches: ReleasePlan::default_library_branches(),
        candidate_branch: "master".to_string(),
        quality_jobs: vec!["unit-tests".to_string(), "code-quality".to_string()],
    }
}

/// A manifest that agrees with every version in `plan`.
pub fn fixture_manifest(plan: &ReleasePlan) -> Manifest {
    Manifest {
        version: plan.umbrella.expected_version.clone(),
        dependencies: plan
            .components
            .iter()
            .map(|c| {
                let display = FIXTURE_COMPONENTS
                    .iter()
                    .find(|(name, ..)| *name == c.name)
                    .map(|(_, display, ..)| display.to_string())
                    .unwrap_or_else(|| c.name.clone());
                ManifestEntry {
                    name: display,
                    version: c.expected_version.clone(),
                    repository_url: Some(format!("https://github.com/{}", c.repository.slug)),
                }
            })
            .collect(),
    }
}

fn branch_set(names: &[&str]) -> BranchSet {
    names.iter().map(|s| s.to_string()).collect()
}

async fn pause(delay: Option<&Duration>) {
    if let Some(d) = delay {
        tokio::time::sleep(*d).await;
    }
}

// ---------------------------------------------------------------------------
// FakeVcs
// ---------------------------------------------------------------------------

/// In-memory version-control host.
#[derive(Debug, Clone, Default)]
pub struct FakeVcs {
    branches: HashMap<String, BranchSet>,
    commits: HashMap<(String, String), CommitId>,
    pins: HashMap<(String, String, PathBuf), CommitId>,
    pulls: HashMap<(String, String), Vec<PullRequest>>,
    failures: HashMap<String, ProviderError>,
    delays: HashMap<String, Duration>,
    probe_error: Option<ProviderError>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fixture repository on its allowed branches, with a head commit.
    ///
    /// The umbrella also carries `release-candidate`, which pins every
    /// library at its `master` head.
    pub fn healthy() -> Self {
        let mut vcs = Self::new().with_branches(
            UMBRELLA_SLUG,
            &["master", "release-candidate", "v4_beta_deprecated"],
        );
        for (name, _, slug, local, _) in FIXTURE_COMPONENTS {
            let head = format!("{name}-head");
            vcs = vcs
                .with_branches(slug, &["master"])
                .with_commit(slug, "master", &head)
                .with_pin(UMBRELLA_SLUG, "release-candidate", local, &head);
        }
        vcs
    }

    pub fn with_branches(mut self, slug: &str, names: &[&str]) -> Self {
        self.branches.insert(slug.to_string(), branch_set(names));
        self
    }

    pub fn with_commit(mut self, slug: &str, branch: &str, sha: &str) -> Self {
        self.commits
            .insert((slug.to_string(), branch.to_string()), CommitId(sha.to_string()));
        self
    }

    pub fn without_commit(mut self, slug: &str, branch: &str) -> Self {
        self.commits.remove(&(slug.to_string(), branch.to_string()));
        self
    }

    /// Record `sha` as the submodule at `path` of `slug` on `git_ref`.
    pub fn with_pin(mut self, slug: &str, git_ref: &str, path: &str, sha: &str) -> Self {
        self.pins.insert(
            (slug.to_string(), git_ref.to_string(), PathBuf::from(path)),
            CommitId(sha.to_string()),
        );
        self
    }

    pub fn without_pin(mut self, slug: &str, git_ref: &str, path: &str) -> Self {
        self.pins
            .remove(&(slug.to_string(), git_ref.to_string(), PathBuf::from(path)));
        self
    }

    pub fn with_pull_request(mut self, slug: &str, base: &str, pr: PullRequest) -> Self {
        self.pulls
            .entry((slug.to_string(), base.to_string()))
            .or_default()
            .push(pr);
        self
    }

    /// Every call about `slug` fails with `err`.
    pub fn failing_repository(mut self, slug: &str, err: ProviderError) -> Self {
        self.failures.insert(slug.to_string(), err);
        self
    }

    pub fn with_delay(mut self, slug: &str, delay: Duration) -> Self {
        self.delays.insert(slug.to_string(), delay);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.probe_error = Some(ProviderError::Unavailable {
            system: "fake-vcs".to_string(),
            detail: "host unreachable".to_string(),
        });
        self
    }

    async fn enter(&self, repo: &RepoLocation) -> ProviderResult<()> {
        pause(self.delays.get(&repo.slug)).await;
        match self.failures.get(&repo.slug) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VersionControlProvider for FakeVcs {
    async fn list_branches(&self, repo: &RepoLocation) -> ProviderResult<BranchSet> {
        self.enter(repo).await?;
        self.branches
            .get(&repo.slug)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("repository {}", repo.slug)))
    }

    async fn latest_commit(&self, repo: &RepoLocation, branch: &str) -> ProviderResult<CommitId> {
        self.enter(repo).await?;
        self.commits
            .get(&(repo.slug.clone(), branch.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("branch {branch} of {}", repo.slug)))
    }

    async fn pinned_submodule(
        &self,
        repo: &RepoLocation,
        path: &Path,
        git_ref: &str,
    ) -> ProviderResult<CommitId> {
        self.enter(repo).await?;
        self.pins
            .get(&(repo.slug.clone(), git_ref.to_string(), path.to_path_buf()))
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "submodule {} on {git_ref} of {}",
                    path.display(),
                    repo.slug
                ))
            })
    }

    async fn open_pull_requests(
        &self,
        repo: &RepoLocation,
        base: &str,
    ) -> ProviderResult<Vec<PullRequest>> {
        self.enter(repo).await?;
        Ok(self
            .pulls
            .get(&(repo.slug.clone(), base.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn probe(&self) -> ProviderResult<()> {
        match &self.probe_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeCi
// ---------------------------------------------------------------------------

/// In-memory CI system keyed by the job's display form (`name@owner/repo`
/// for repository jobs, `name` for pipeline jobs).
#[derive(Debug, Clone)]
pub struct FakeCi {
    default_status: JobStatus,
    statuses: HashMap<String, JobStatus>,
    statuses_at: HashMap<(String, String), JobStatus>,
    errors: HashMap<String, ProviderError>,
    repository_failures: HashMap<String, ProviderError>,
    delays: HashMap<String, Duration>,
    probe_error: Option<ProviderError>,
}

impl FakeCi {
    /// Every job passes unless overridden.
    pub fn passing() -> Self {
        Self {
            default_status: JobStatus::Pass,
            statuses: HashMap::new(),
            statuses_at: HashMap::new(),
            errors: HashMap::new(),
            repository_failures: HashMap::new(),
            delays: HashMap::new(),
            probe_error: None,
        }
    }

    pub fn with_status(mut self, job: &str, status: JobStatus) -> Self {
        self.statuses.insert(job.to_string(), status);
        self
    }

    /// Status of `job` at one revision only; other revisions keep the default.
    pub fn with_status_at(mut self, job: &str, revision: &str, status: JobStatus) -> Self {
        self.statuses_at
            .insert((job.to_string(), revision.to_string()), status);
        self
    }

    pub fn with_error(mut self, job: &str, err: ProviderError) -> Self {
        self.errors.insert(job.to_string(), err);
        self
    }

    /// Every job bound to `slug` fails with `err`.
    pub fn failing_repository(mut self, slug: &str, err: ProviderError) -> Self {
        self.repository_failures.insert(slug.to_string(), err);
        self
    }

    pub fn with_delay(mut self, job: &str, delay: Duration) -> Self {
        self.delays.insert(job.to_string(), delay);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.probe_error = Some(ProviderError::Unavailable {
            system: "fake-ci".to_string(),
            detail: "connection refused".to_string(),
        });
        self
    }
}

#[async_trait]
impl CiProvider for FakeCi {
    async fn job_status(&self, job: &JobRef, revision: &str) -> ProviderResult<JobStatus> {
        let key = job.to_string();
        pause(self.delays.get(&key)).await;
        if let Some(repo) = &job.repository {
            if let Some(err) = self.repository_failures.get(&repo.slug) {
                return Err(err.clone());
            }
        }
        if let Some(err) = self.errors.get(&key) {
            return Err(err.clone());
        }
        if let Some(status) = self.statuses_at.get(&(key.clone(), revision.to_string())) {
            return Ok(*status);
        }
        Ok(self.statuses.get(&key).copied().unwrap_or(self.default_status))
    }

    async fn probe(&self) -> ProviderResult<()> {
        match &self.probe_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeManifest / FakeDocs
// ---------------------------------------------------------------------------

/// Serves a fixed manifest, or a fixed error.
#[derive(Debug, Clone)]
pub struct FakeManifest {
    result: ProviderResult<Manifest>,
}

impl FakeManifest {
    pub fn serving(manifest: Manifest) -> Self {
        Self {
            result: Ok(manifest),
        }
    }

    pub fn failing(err: ProviderError) -> Self {
        Self { result: Err(err) }
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.result.as_ref().ok()
    }
}

#[async_trait]
impl ManifestProvider for FakeManifest {
    async fn read_manifest(&self, _path: &Path) -> ProviderResult<Manifest> {
        self.result.clone()
    }
}

/// Serves fixed document listings per directory.
#[derive(Debug, Clone, Default)]
pub struct FakeDocs {
    listings: HashMap<PathBuf, Vec<PathBuf>>,
}

impl FakeDocs {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_documents(mut self, dir: &str, files: &[&str]) -> Self {
        self.listings
            .entry(PathBuf::from(dir))
            .or_default()
            .extend(files.iter().map(PathBuf::from));
        self
    }
}

#[async_trait]
impl DocumentLocator for FakeDocs {
    async fn locate(&self, dir: &Path, file_names: &[&str]) -> ProviderResult<Vec<PathBuf>> {
        let wanted: BTreeSet<&str> = file_names.iter().copied().collect();
        Ok(self
            .listings
            .get(dir)
            .map(|files| {
                files
                    .iter()
                    .filter(|p| {
                        p.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| wanted.contains(n))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// ProviderSet
// ---------------------------------------------------------------------------

/// Fixture plan plus one of each fake, editable field by field.
#[derive(Debug, Clone)]
pub struct ProviderSet {
    pub plan: ReleasePlan,
    pub vcs: FakeVcs,
    pub ci: FakeCi,
    pub manifest: FakeManifest,
    pub docs: FakeDocs,
    pub call_timeout: Duration,
}

impl ProviderSet {
    /// Everything green: a run over this set yields no error findings.
    pub fn healthy() -> Self {
        let plan = fixture_plan();
        let manifest = FakeManifest::serving(fixture_manifest(&plan));
        Self {
            plan,
            vcs: FakeVcs::healthy(),
            ci: FakeCi::passing(),
            manifest,
            docs: FakeDocs::empty(),
            call_timeout: Duration::from_secs(5),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers::new(
            Arc::new(self.vcs.clone()),
            Arc::new(self.ci.clone()),
            Arc::new(self.manifest.clone()),
            Arc::new(self.docs.clone()),
        )
    }

    /// A check context as the runner would build it after a successful
    /// manifest read.
    pub fn context(&self) -> CheckContext {
        CheckContext::new(
            Arc::new(self.plan.clone()),
            Arc::new(self.manifest.manifest().cloned().unwrap_or_default()),
            self.providers(),
            self.call_timeout,
            Arc::new(Vec::new()),
        )
    }
}
