//! Jenkins adapter for umbrella pipeline jobs.
//!
//! A job's status is the `result` of the build selected by the revision,
//! e.g. `lastCompletedBuild`, read from `{url}/{job}/{revision}/api/json`.

use std::time::Duration;

use async_trait::async_trait;
use csdk_release_core::{CiProvider, JobRef, JobStatus, ProviderError, ProviderResult};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{build_client, decode, transport_error};
use crate::secret::Secret;

const SYSTEM: &str = "jenkins";

#[derive(Debug, Clone)]
pub struct JenkinsConfig {
    pub url: String,
    pub username: String,
    pub password: Secret,
    /// When false, the server certificate is not verified.
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl JenkinsConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: Secret) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password,
            verify_tls: true,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API URL for `job` at build selector `revision`.
    pub fn build_url(&self, job: &str, revision: &str) -> String {
        format!(
            "{}/{}/{}/api/json",
            self.url,
            job.trim_matches('/'),
            revision.trim_matches('/')
        )
    }
}

pub struct JenkinsClient {
    http: reqwest::Client,
    config: JenkinsConfig,
}

impl JenkinsClient {
    pub fn new(config: JenkinsConfig) -> ProviderResult<Self> {
        if !config.verify_tls {
            warn!(url = %config.url, "jenkins server certificate verification disabled");
        }
        let http = build_client(config.timeout, config.verify_tls)?;
        Ok(Self { http, config })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.config.username, Some(self.config.password.expose()))
    }
}

#[async_trait]
impl CiProvider for JenkinsClient {
    async fn job_status(&self, job: &JobRef, revision: &str) -> ProviderResult<JobStatus> {
        if job.repository.is_some() {
            return Err(ProviderError::NotFound(format!(
                "job {job} is repository-scoped"
            )));
        }
        let what = format!("{} build of {}", revision, job.name);
        let response = self
            .get(self.config.build_url(&job.name, revision))
            .send()
            .await
            .map_err(|e| transport_error(SYSTEM, e, self.config.timeout))?;
        let build: BuildInfo = decode(&what, response).await?;
        let status = build_status(&build);
        debug!(job = %job, revision, status = %status, "jenkins build status");
        Ok(status)
    }

    async fn probe(&self) -> ProviderResult<()> {
        let response = self
            .get(format!("{}/api/json", self.config.url))
            .send()
            .await
            .map_err(|e| transport_error(SYSTEM, e, self.config.timeout))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable {
                system: SYSTEM.to_string(),
                detail: format!("server answered HTTP {status}"),
            })
        }
    }
}

/// Subset of a Jenkins build record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
}

pub fn build_status(build: &BuildInfo) -> JobStatus {
    if build.building {
        return JobStatus::Unknown;
    }
    match build.result.as_deref() {
        Some("SUCCESS") => JobStatus::Pass,
        Some("FAILURE") | Some("UNSTABLE") | Some("ABORTED") => JobStatus::Fail,
        _ => JobStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> BuildInfo {
        serde_json::from_str(body).expect("parse build")
    }

    #[test]
    fn test_build_results() {
        assert_eq!(build_status(&parse(r#"{"result":"SUCCESS","number":12}"#)), JobStatus::Pass);
        assert_eq!(build_status(&parse(r#"{"result":"FAILURE"}"#)), JobStatus::Fail);
        assert_eq!(build_status(&parse(r#"{"result":"UNSTABLE"}"#)), JobStatus::Fail);
        assert_eq!(build_status(&parse(r#"{"result":null}"#)), JobStatus::Unknown);
        assert_eq!(build_status(&parse(r#"{"result":"NOT_BUILT"}"#)), JobStatus::Unknown);
    }

    #[test]
    fn test_running_build_is_unknown() {
        let build = parse(r#"{"result":"SUCCESS","building":true}"#);
        assert_eq!(build_status(&build), JobStatus::Unknown);
    }

    #[test]
    fn test_build_url() {
        let config = JenkinsConfig::new("https://ci.example.com/", "release", Secret::new("pw"));
        assert_eq!(
            config.build_url("job/csdk/job/nightly", "lastCompletedBuild"),
            "https://ci.example.com/job/csdk/job/nightly/lastCompletedBuild/api/json"
        );
    }

    #[test]
    fn test_config_debug_hides_password() {
        let config = JenkinsConfig::new("https://ci.example.com", "release", Secret::new("pw-123"));
        assert!(!format!("{config:?}").contains("pw-123"));
    }

    #[tokio::test]
    async fn test_repository_job_is_not_served() {
        let client = JenkinsClient::new(JenkinsConfig::new("https://ci.example.com", "u", Secret::new("p")))
            .expect("client");
        let job = JobRef::for_repository("unit-tests", csdk_release_core::RepoLocation::new("FreeRTOS/coreMQTT"));
        let err = client.job_status(&job, "abc").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
