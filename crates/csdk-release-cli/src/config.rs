//! `config.yml` loading and release plan construction.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csdk_release_adapters::github::COMBINED_STATUS_JOB;
use csdk_release_adapters::{repo_slug_from_url, Secret};
use csdk_release_core::{
    BranchSet, Component, JobRef, Manifest, ReleasePlan, RepoLocation, Umbrella, VerifyError,
    VerifyResult,
};
use serde::Deserialize;

/// Environment variable that overrides `github_access_token`.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_ACCESS_TOKEN";

/// Config location relative to the umbrella checkout.
pub const DEFAULT_CONFIG_PATH: &str = "tools/release/config.yml";

fn default_jenkins_jobs() -> Vec<String> {
    vec![
        "job/csdk/job/demo_pipeline".to_string(),
        "job/csdk/job/nightly".to_string(),
    ]
}

fn default_quality_jobs() -> Vec<String> {
    vec![
        "unit-tests".to_string(),
        "code-quality".to_string(),
        COMBINED_STATUS_JOB.to_string(),
    ]
}

fn default_candidate_branch() -> String {
    "master".to_string()
}

fn default_release_branch() -> String {
    "release-candidate".to_string()
}

fn default_library_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("libraries/aws"), PathBuf::from("libraries/standard")]
}

fn default_umbrella_name() -> String {
    "aws-iot-device-sdk-embedded-c".to_string()
}

fn default_umbrella_repository() -> String {
    "aws/aws-iot-device-sdk-embedded-c".to_string()
}

fn default_umbrella_branches() -> BranchSet {
    ReleasePlan::default_umbrella_branches()
}

fn default_library_branches() -> BranchSet {
    ReleasePlan::default_library_branches()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("manifest.yml")
}

fn default_pipeline_revision() -> String {
    "lastCompletedBuild".to_string()
}

fn default_github_api_url() -> String {
    csdk_release_adapters::github::DEFAULT_API_URL.to_string()
}

/// Release configuration as written in `config.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseConfig {
    /// Version the umbrella manifest must declare.
    pub csdk_version: String,
    /// Expected version per component, keyed by lower-case component name.
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
    /// Explicit `owner/name` per component; otherwise taken from the manifest.
    #[serde(default)]
    pub repositories: BTreeMap<String, String>,
    #[serde(default)]
    pub github_access_token: Option<Secret>,
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
    #[serde(default)]
    pub jenkins_url: Option<String>,
    #[serde(default)]
    pub jenkins_username: Option<String>,
    #[serde(default)]
    pub jenkins_password: Option<Secret>,
    #[serde(default = "default_jenkins_jobs")]
    pub jenkins_jobs: Vec<String>,
    #[serde(default = "default_pipeline_revision")]
    pub pipeline_revision: String,
    #[serde(default = "default_quality_jobs")]
    pub quality_jobs: Vec<String>,
    #[serde(default = "default_candidate_branch")]
    pub candidate_branch: String,
    #[serde(default = "default_release_branch")]
    pub release_branch: String,
    #[serde(default = "default_library_dirs")]
    pub library_dirs: Vec<PathBuf>,
    #[serde(default = "default_umbrella_name")]
    pub umbrella_name: String,
    #[serde(default = "default_umbrella_repository")]
    pub umbrella_repository: String,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "default_umbrella_branches")]
    pub umbrella_branches: BranchSet,
    #[serde(default = "default_library_branches")]
    pub library_branches: BranchSet,
}

/// Jenkins settings, present when pipeline jobs are configured.
#[derive(Debug, Clone)]
pub struct JenkinsCredentials {
    pub url: String,
    pub username: String,
    pub password: Secret,
}

impl ReleaseConfig {
    pub fn parse(text: &str) -> VerifyResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| VerifyError::ConfigurationIncomplete(format!("invalid config: {e}")))
    }

    pub fn load(path: &Path) -> VerifyResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            VerifyError::ConfigurationIncomplete(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// GitHub token; `env_token` (from [`GITHUB_TOKEN_ENV`]) wins over the file.
    pub fn github_token(&self, env_token: Option<String>) -> VerifyResult<Secret> {
        env_token
            .filter(|t| !t.trim().is_empty())
            .map(Secret::new)
            .or_else(|| self.github_access_token.clone().filter(|t| !t.is_empty()))
            .ok_or_else(|| {
                VerifyError::ConfigurationIncomplete(format!(
                    "no GitHub access token: set {GITHUB_TOKEN_ENV} or github_access_token in config.yml"
                ))
            })
    }

    /// Jenkins credentials, or `None` when no pipeline jobs are configured.
    pub fn jenkins(&self) -> VerifyResult<Option<JenkinsCredentials>> {
        if self.jenkins_jobs.is_empty() {
            return Ok(None);
        }
        let missing = |field: &str| {
            VerifyError::ConfigurationIncomplete(format!(
                "{field} is required when jenkins_jobs are configured"
            ))
        };
        let url = self
            .jenkins_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| missing("jenkins_url"))?;
        let username = self
            .jenkins_username
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| missing("jenkins_username"))?;
        let password = self
            .jenkins_password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| missing("jenkins_password"))?;
        Ok(Some(JenkinsCredentials {
            url,
            username,
            password,
        }))
    }

    /// Checks that need no manifest.
    pub fn validate(&self) -> VerifyResult<()> {
        let incomplete = |msg: String| Err(VerifyError::ConfigurationIncomplete(msg));
        if self.csdk_version.trim().is_empty() {
            return incomplete("csdk_version is empty".to_string());
        }
        if self.versions.is_empty() {
            return incomplete("versions lists no components".to_string());
        }
        for (name, version) in &self.versions {
            if version.trim().is_empty() {
                return incomplete(format!("component {name} has an empty version"));
            }
        }
        if self.umbrella_repository.split('/').count() != 2 {
            return incomplete(format!(
                "umbrella_repository {:?} is not of the form owner/name",
                self.umbrella_repository
            ));
        }
        Ok(())
    }

    /// Build the plan for checkout `root`, resolving component repositories
    /// from `manifest` where the config names none.
    pub fn build_plan(&self, root: &Path, manifest: &Manifest) -> VerifyResult<ReleasePlan> {
        self.validate()?;
        let components = self
            .versions
            .iter()
            .map(|(name, version)| {
                let slug = self.repository_slug(name, manifest)?;
                let mut repository = RepoLocation::new(slug);
                if let Some(local) = self.local_path(root, name, &repository) {
                    repository = repository.with_local_path(local);
                }
                Ok(Component::new(name.clone(), version.clone(), repository))
            })
            .collect::<VerifyResult<Vec<_>>>()?;

        Ok(ReleasePlan {
            root: root.to_path_buf(),
            umbrella: Umbrella {
                name: self.umbrella_name.clone(),
                expected_version: self.csdk_version.clone(),
                repository: RepoLocation::new(self.umbrella_repository.clone()),
                manifest_path: self.manifest_path.clone(),
                allowed_branches: self.umbrella_branches.clone(),
                release_branch: self.release_branch.clone(),
                pipeline_jobs: self.jenkins_jobs.iter().map(JobRef::pipeline).collect(),
                pipeline_revision: self.pipeline_revision.clone(),
            },
            components,
            library_branches: self.library_branches.clone(),
            candidate_branch: self.candidate_branch.clone(),
            quality_jobs: self.quality_jobs.clone(),
        })
    }

    fn repository_slug(&self, name: &str, manifest: &Manifest) -> VerifyResult<String> {
        if let Some(slug) = self.repositories.get(name) {
            return Ok(slug.clone());
        }
        manifest
            .entries_for(name)
            .into_iter()
            .find_map(|entry| entry.repository_url.as_deref().and_then(repo_slug_from_url))
            .ok_or_else(|| {
                VerifyError::ConfigurationIncomplete(format!(
                    "component {name} has no repository: add it under repositories or give it a repository url in the manifest"
                ))
            })
    }

    /// Submodule directory of a component, matched case-insensitively against
    /// the component name or its repository name.
    fn local_path(&self, root: &Path, name: &str, repository: &RepoLocation) -> Option<PathBuf> {
        let repo_name = repository.slug.rsplit('/').next().unwrap_or(name);
        self.library_dirs.iter().find_map(|dir| {
            let entries = fs::read_dir(root.join(dir)).ok()?;
            entries.flatten().find_map(|entry| {
                let file_name = entry.file_name();
                let file_name = file_name.to_str()?;
                let matches = file_name.eq_ignore_ascii_case(name)
                    || file_name.eq_ignore_ascii_case(repo_name);
                (matches && entry.path().is_dir()).then(|| dir.join(file_name))
            })
        })
    }
}
