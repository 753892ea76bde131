//! Routes job lookups to the CI system that owns them.

use std::sync::Arc;

use async_trait::async_trait;
use csdk_release_core::{CiProvider, JobRef, JobStatus, ProviderResult};

/// Repository-scoped jobs go to `repository_jobs`, pipeline jobs to
/// `pipeline_jobs`.
#[derive(Clone)]
pub struct RoutingCiProvider {
    repository_jobs: Arc<dyn CiProvider>,
    pipeline_jobs: Arc<dyn CiProvider>,
}

impl RoutingCiProvider {
    pub fn new(repository_jobs: Arc<dyn CiProvider>, pipeline_jobs: Arc<dyn CiProvider>) -> Self {
        Self {
            repository_jobs,
            pipeline_jobs,
        }
    }
}

#[async_trait]
impl CiProvider for RoutingCiProvider {
    async fn job_status(&self, job: &JobRef, revision: &str) -> ProviderResult<JobStatus> {
        if job.repository.is_some() {
            self.repository_jobs.job_status(job, revision).await
        } else {
            self.pipeline_jobs.job_status(job, revision).await
        }
    }

    async fn probe(&self) -> ProviderResult<()> {
        self.repository_jobs.probe().await?;
        self.pipeline_jobs.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csdk_release_core::fakes::FakeCi;
    use csdk_release_core::{ProviderError, RepoLocation};

    #[tokio::test]
    async fn test_routes_by_job_scope() {
        let github = FakeCi::passing().with_status("unit-tests@FreeRTOS/coreMQTT", JobStatus::Fail);
        let jenkins = FakeCi::passing().with_status("job/csdk/job/nightly", JobStatus::Unknown);
        let router = RoutingCiProvider::new(Arc::new(github), Arc::new(jenkins));

        let repo_job = JobRef::for_repository("unit-tests", RepoLocation::new("FreeRTOS/coreMQTT"));
        assert_eq!(router.job_status(&repo_job, "sha").await, Ok(JobStatus::Fail));
        let pipeline = JobRef::pipeline("job/csdk/job/nightly");
        assert_eq!(
            router.job_status(&pipeline, "lastCompletedBuild").await,
            Ok(JobStatus::Unknown)
        );
    }

    #[tokio::test]
    async fn test_reachability_fails_when_either_side_is_down() {
        let router = RoutingCiProvider::new(
            Arc::new(FakeCi::passing()),
            Arc::new(FakeCi::passing().unreachable()),
        );
        assert!(matches!(
            router.probe().await,
            Err(ProviderError::Unavailable { .. })
        ));
    }
}
