//! Findings: the atomic unit of a verification report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a finding blocks the release or only asks for human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Error,
    ReviewItem,
}

/// The area a finding belongs to.
///
/// Variant order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Tests,
    Ci,
    BranchPolicy,
    ManifestVersion,
    PullRequests,
    DocReview,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Tests,
        Category::Ci,
        Category::BranchPolicy,
        Category::ManifestVersion,
        Category::PullRequests,
        Category::DocReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tests => "tests",
            Category::Ci => "ci",
            Category::BranchPolicy => "branch-policy",
            Category::ManifestVersion => "manifest-version",
            Category::PullRequests => "pull-requests",
            Category::DocReview => "doc-review",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reportable observation produced by a check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    /// Component or repository the finding is about.
    pub subject: String,
    pub message: String,
}

impl Finding {
    pub fn error(category: Category, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Review items carry the path of the document to review as their message.
    pub fn review_item(subject: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            severity: Severity::ReviewItem,
            category: Category::DocReview,
            subject: subject.into(),
            message: path.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.category, self.subject, self.message)
    }
}

/// The run's overall judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_matches_report_order() {
        let mut shuffled = vec![
            Category::DocReview,
            Category::ManifestVersion,
            Category::Tests,
            Category::PullRequests,
            Category::BranchPolicy,
            Category::Ci,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL.to_vec());
    }

    #[test]
    fn test_finding_display_is_error_log_line() {
        let f = Finding::error(Category::BranchPolicy, "coremqtt", "unexpected branches: feature-x");
        assert_eq!(f.to_string(), "branch-policy: coremqtt: unexpected branches: feature-x");
    }

    #[test]
    fn test_review_item_is_not_error() {
        let f = Finding::review_item("corejson", "libraries/standard/coreJSON/README.md");
        assert!(!f.is_error());
        assert_eq!(f.category, Category::DocReview);
    }

    #[test]
    fn test_category_serde_kebab_case() {
        let json = serde_json::to_string(&Category::ManifestVersion).expect("serialize");
        assert_eq!(json, "\"manifest-version\"");
    }
}
