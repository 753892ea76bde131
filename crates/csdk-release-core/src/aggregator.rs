//! Result aggregation: findings from every check into one verdict and a
//! deterministically ordered report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::finding::{Category, Finding, Verdict};

/// Verdict plus the ordered findings it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
}

impl Aggregate {
    /// Error-severity findings in report order.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    /// Review-item findings in report order.
    pub fn review_items(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn review_item_count(&self) -> usize {
        self.review_items().count()
    }

    /// Number of error findings per category, with zero entries omitted.
    pub fn errors_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for f in self.errors() {
            *counts.entry(f.category).or_insert(0) += 1;
        }
        counts
    }
}

/// Order findings and derive the verdict.
///
/// Ordering is by category (report order), subject, severity, then message.
/// Emission order is only the final tie-break, after subject, severity and
/// message, and decides nothing but the relative position of identical
/// findings. Identical inputs always render identical reports.
pub fn aggregate(findings: Vec<Finding>) -> Aggregate {
    let mut findings = findings;
    findings.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.subject.cmp(&b.subject))
            .then_with(|| a.severity.cmp(&b.severity))
            .then_with(|| a.message.cmp(&b.message))
    });

    let verdict = if findings.iter().any(Finding::is_error) {
        Verdict::Fail
    } else {
        Verdict::Pass
    };

    Aggregate { verdict, findings }
}
