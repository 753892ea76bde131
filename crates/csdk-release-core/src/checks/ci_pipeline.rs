//! Latest run of each designated umbrella pipeline job must pass.

use async_trait::async_trait;

use crate::checks::{job_status_problem, Check, CheckContext};
use crate::error::ProviderResult;
use crate::finding::{Category, Finding};
use crate::model::{ReleasePlan, Target};

pub struct CiPipelineCheck;

#[async_trait]
impl Check for CiPipelineCheck {
    fn name(&self) -> &'static str {
        "ci-pipeline"
    }

    fn category(&self) -> Category {
        Category::Ci
    }

    fn targets(&self, _plan: &ReleasePlan) -> Vec<Target> {
        vec![Target::Umbrella]
    }

    async fn evaluate(&self, ctx: &CheckContext, target: &Target) -> ProviderResult<Vec<Finding>> {
        let plan = ctx.plan();
        let umbrella = &plan.umbrella;
        let subject = target.subject(plan);
        let scope = format!("{} ({})", umbrella.repository.slug, umbrella.pipeline_revision);

        let mut findings = Vec::new();
        for job in &umbrella.pipeline_jobs {
            let outcome = ctx.job_status(job, &umbrella.pipeline_revision).await;
            if let Some(problem) = job_status_problem(&job.name, &scope, &outcome, ctx) {
                findings.push(Finding::error(Category::Ci, subject, problem));
            }
        }
        Ok(findings)
    }
}
