//! The umbrella's release branch must exist and have no open pull requests
//! against it.

use async_trait::async_trait;

use crate::checks::{Check, CheckContext};
use crate::error::ProviderResult;
use crate::finding::{Category, Finding};
use crate::model::{ReleasePlan, Target};

pub struct PullRequestCheck;

#[async_trait]
impl Check for PullRequestCheck {
    fn name(&self) -> &'static str {
        "pull-requests"
    }

    fn category(&self) -> Category {
        Category::PullRequests
    }

    fn targets(&self, _plan: &ReleasePlan) -> Vec<Target> {
        vec![Target::Umbrella]
    }

    async fn evaluate(&self, ctx: &CheckContext, target: &Target) -> ProviderResult<Vec<Finding>> {
        let plan = ctx.plan();
        let umbrella = &plan.umbrella;
        let branches = ctx.list_branches(&umbrella.repository).await?;
        if !branches.contains(&umbrella.release_branch) {
            return Ok(vec![Finding::error(
                Category::PullRequests,
                target.subject(plan),
                format!(
                    "release branch {} does not exist in {}",
                    umbrella.release_branch, umbrella.repository.slug
                ),
            )]);
        }
        let mut pulls = ctx
            .open_pull_requests(&umbrella.repository, &umbrella.release_branch)
            .await?;
        pulls.sort_by_key(|pr| pr.number);

        Ok(pulls
            .into_iter()
            .map(|pr| {
                Finding::error(
                    Category::PullRequests,
                    target.subject(plan),
                    format!(
                        "pull request #{} into {} is still open: {}",
                        pr.number, umbrella.release_branch, pr.url
                    ),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeVcs, ProviderSet};
    use crate::model::PullRequest;

    #[tokio::test]
    async fn test_each_open_pull_request_is_an_error() {
        let mut set = ProviderSet::healthy();
        set.vcs = FakeVcs::healthy()
            .with_pull_request(
                "aws/aws-iot-device-sdk-embedded-c",
                "release-candidate",
                PullRequest {
                    number: 1204,
                    url: "https://github.com/aws/aws-iot-device-sdk-embedded-c/pull/1204".to_string(),
                },
            )
            .with_pull_request(
                "aws/aws-iot-device-sdk-embedded-c",
                "release-candidate",
                PullRequest {
                    number: 1190,
                    url: "https://github.com/aws/aws-iot-device-sdk-embedded-c/pull/1190".to_string(),
                },
            );
        let findings = PullRequestCheck
            .evaluate(&set.context(), &Target::Umbrella)
            .await
            .unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("#1190"));
        assert!(findings[1].message.contains("#1204"));
    }

    #[tokio::test]
    async fn test_missing_release_branch_is_an_error() {
        let mut set = ProviderSet::healthy();
        set.vcs = FakeVcs::healthy().with_branches(
            "aws/aws-iot-device-sdk-embedded-c",
            &["master", "v4_beta_deprecated"],
        );
        let findings = PullRequestCheck
            .evaluate(&set.context(), &Target::Umbrella)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "release branch release-candidate does not exist in aws/aws-iot-device-sdk-embedded-c"
        );
    }

    #[tokio::test]
    async fn test_pull_requests_against_other_branches_are_ignored() {
        let mut set = ProviderSet::healthy();
        set.vcs = FakeVcs::healthy().with_pull_request(
            "aws/aws-iot-device-sdk-embedded-c",
            "master",
            PullRequest {
                number: 7,
                url: "https://github.com/aws/aws-iot-device-sdk-embedded-c/pull/7".to_string(),
            },
        );
        let findings = PullRequestCheck
            .evaluate(&set.context(), &Target::Umbrella)
            .await
            .unwrap();
        assert!(findings.is_empty());
    }
}
