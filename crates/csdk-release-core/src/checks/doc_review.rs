//! Discovers the CHANGELOG.md and README.md files a human must review before
//! release. Advisory only: every finding is a review item.

use std::path::{Component as PathComponent, Path};

use async_trait::async_trait;

use crate::checks::{Check, CheckContext};
use crate::error::ProviderResult;
use crate::finding::{Category, Finding};
use crate::model::{ReleasePlan, Target};

/// File names collected for review.
pub const REVIEW_DOCUMENTS: [&str; 2] = ["CHANGELOG.md", "README.md"];

pub struct DocReviewCheck;

/// `path` relative to `root` with `/` separators, or `path` as-is when it is
/// outside `root`.
pub fn display_relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            PathComponent::Normal(part) => Some(part.to_string_lossy().into_owned()),
            PathComponent::RootDir => Some(String::new()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl Check for DocReviewCheck {
    fn name(&self) -> &'static str {
        "doc-review"
    }

    fn category(&self) -> Category {
        Category::DocReview
    }

    fn targets(&self, plan: &ReleasePlan) -> Vec<Target> {
        std::iter::once(Target::Umbrella)
            .chain(
                plan.components
                    .iter()
                    .filter(|c| c.repository.local_path.is_some())
                    .cloned()
                    .map(Target::Component),
            )
            .collect()
    }

    async fn evaluate(&self, ctx: &CheckContext, target: &Target) -> ProviderResult<Vec<Finding>> {
        let plan = ctx.plan();
        let dir = match target {
            Target::Umbrella => plan.root.clone(),
            Target::Component(component) => match &component.repository.local_path {
                Some(local) => plan.root.join(local),
                None => return Ok(Vec::new()),
            },
        };

        let mut paths: Vec<String> = ctx
            .locate_documents(&dir, &REVIEW_DOCUMENTS)
            .await?
            .iter()
            .map(|p| display_relative(&plan.root, p))
            .collect();
        paths.sort();
        paths.dedup();

        let subject = target.subject(plan);
        Ok(paths
            .into_iter()
            .map(|path| Finding::review_item(subject, path))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{fixture_plan, FakeDocs, ProviderSet};
    use crate::finding::Severity;

    #[test]
    fn test_display_relative_strips_root() {
        let root = Path::new("/csdk");
        assert_eq!(
            display_relative(root, Path::new("/csdk/libraries/standard/coreMQTT/README.md")),
            "libraries/standard/coreMQTT/README.md"
        );
        assert_eq!(display_relative(root, Path::new("/elsewhere/README.md")), "/elsewhere/README.md");
    }

    #[tokio::test]
    async fn test_component_documents_become_review_items() {
        let mut set = ProviderSet::healthy();
        set.docs = FakeDocs::empty().with_documents(
            "/csdk/libraries/standard/coreMQTT",
            &[
                "/csdk/libraries/standard/coreMQTT/README.md",
                "/csdk/libraries/standard/coreMQTT/CHANGELOG.md",
                "/csdk/libraries/standard/coreMQTT/docs/notes.txt",
            ],
        );
        let target = Target::Component(fixture_plan().component("coremqtt").cloned().unwrap());
        let findings = DocReviewCheck.evaluate(&set.context(), &target).await.unwrap();
        let paths: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "libraries/standard/coreMQTT/CHANGELOG.md",
                "libraries/standard/coreMQTT/README.md",
            ]
        );
        assert!(findings.iter().all(|f| f.severity == Severity::ReviewItem));
    }

    #[test]
    fn test_targets_skip_components_without_checkout() {
        let mut plan = fixture_plan();
        plan.components[0].repository.local_path = None;
        let targets = DocReviewCheck.targets(&plan);
        assert_eq!(targets.len(), plan.components.len());
        assert_eq!(targets[0], Target::Umbrella);
    }
}
