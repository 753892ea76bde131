//! Branch topology must match the allow-list exactly: `{master}` for library
//! repositories and `{master, v4_beta_deprecated}` for the umbrella.
//!
//! The umbrella's release branch is a staging branch and is neither required
//! nor unexpected here; its presence is checked with the pending pull requests.

use async_trait::async_trait;

use crate::checks::{Check, CheckContext};
use crate::error::ProviderResult;
use crate::finding::{Category, Finding};
use crate::model::{BranchSet, ReleasePlan, Target};

pub struct BranchPolicyCheck;

/// Describe how `actual` deviates from `expected`, or `None` if they match.
pub fn branch_deviation(expected: &BranchSet, actual: &BranchSet) -> Option<String> {
    let unexpected: Vec<&str> = actual.difference(expected).map(String::as_str).collect();
    let missing: Vec<&str> = expected.difference(actual).map(String::as_str).collect();

    let mut parts = Vec::new();
    if !unexpected.is_empty() {
        parts.push(format!("unexpected branches: {}", unexpected.join(", ")));
    }
    if !missing.is_empty() {
        parts.push(format!("missing branches: {}", missing.join(", ")));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

#[async_trait]
impl Check for BranchPolicyCheck {
    fn name(&self) -> &'static str {
        "branch-policy"
    }

    fn category(&self) -> Category {
        Category::BranchPolicy
    }

    fn targets(&self, plan: &ReleasePlan) -> Vec<Target> {
        std::iter::once(Target::Umbrella)
            .chain(plan.components.iter().cloned().map(Target::Component))
            .collect()
    }

    async fn evaluate(&self, ctx: &CheckContext, target: &Target) -> ProviderResult<Vec<Finding>> {
        let plan = ctx.plan();
        let expected = match target {
            Target::Umbrella => &plan.umbrella.allowed_branches,
            Target::Component(_) => &plan.library_branches,
        };
        let repo = target.repository(plan);
        let mut actual = ctx.list_branches(repo).await?;
        if matches!(target, Target::Umbrella) && !expected.contains(&plan.umbrella.release_branch) {
            actual.remove(&plan.umbrella.release_branch);
        }

        Ok(branch_deviation(expected, &actual)
            .map(|deviation| {
                Finding::error(
                    Category::BranchPolicy,
                    target.subject(plan),
                    format!("repository {} has {deviation}", repo.slug),
                )
            })
            .into_iter()
            .collect())
    }
}
