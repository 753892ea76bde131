//! Unit-test and code-quality job status of every library at its release
//! candidate commit.
//!
//! The candidate commit of a library with a known submodule path is the one
//! pinned on the umbrella's release branch. Libraries without a path fall
//! back to the head of the candidate branch in their own repository.

use async_trait::async_trait;

use crate::checks::{job_status_problem, Check, CheckContext};
use crate::error::{ProviderError, ProviderResult};
use crate::finding::{Category, Finding};
use crate::model::{CommitId, Component, JobRef, ReleasePlan, Target};

pub struct TestsAndQualityCheck;

/// Where a component's candidate commit came from.
enum Candidate {
    Resolved { commit: CommitId, scope: String },
    Unpinned(String),
}

async fn resolve_candidate(ctx: &CheckContext, component: &Component) -> ProviderResult<Candidate> {
    let plan = ctx.plan();
    let repo = &component.repository;
    let Some(path) = repo.local_path.as_deref() else {
        let commit = ctx.latest_commit(repo, &plan.candidate_branch).await?;
        let scope = format!("{} at {} ({})", repo.slug, commit, plan.candidate_branch);
        return Ok(Candidate::Resolved { commit, scope });
    };

    let umbrella = &plan.umbrella;
    match ctx
        .pinned_submodule(&umbrella.repository, path, &umbrella.release_branch)
        .await
    {
        Ok(commit) => {
            let scope = format!(
                "{} at {} (pinned on {} of {})",
                repo.slug, commit, umbrella.release_branch, umbrella.repository.slug
            );
            Ok(Candidate::Resolved { commit, scope })
        }
        Err(ProviderError::NotFound(_)) => Ok(Candidate::Unpinned(format!(
            "no commit of {} is pinned at {} on {} of {}",
            repo.slug,
            path.display(),
            umbrella.release_branch,
            umbrella.repository.slug
        ))),
        Err(err) => Err(err),
    }
}

#[async_trait]
impl Check for TestsAndQualityCheck {
    fn name(&self) -> &'static str {
        "tests-and-quality"
    }

    fn category(&self) -> Category {
        Category::Tests
    }

    fn targets(&self, plan: &ReleasePlan) -> Vec<Target> {
        plan.components.iter().cloned().map(Target::Component).collect()
    }

    async fn evaluate(&self, ctx: &CheckContext, target: &Target) -> ProviderResult<Vec<Finding>> {
        let Target::Component(component) = target else {
            return Ok(Vec::new());
        };
        let (commit, scope) = match resolve_candidate(ctx, component).await? {
            Candidate::Resolved { commit, scope } => (commit, scope),
            Candidate::Unpinned(message) => {
                return Ok(vec![Finding::error(Category::Tests, &component.name, message)]);
            }
        };

        let mut findings = Vec::new();
        for job_name in &ctx.plan().quality_jobs {
            let job = JobRef::for_repository(job_name.as_str(), component.repository.clone());
            let outcome = ctx.job_status(&job, commit.as_str()).await;
            if let Some(problem) = job_status_problem(job_name, &scope, &outcome, ctx) {
                findings.push(Finding::error(Category::Tests, &component.name, problem));
            }
        }
        Ok(findings)
    }
}
