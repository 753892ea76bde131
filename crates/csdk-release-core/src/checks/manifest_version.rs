//! Manifest-declared versions must equal the operator's expected versions.
//!
//! Comparison is exact string equality, including any leading `v`.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::checks::{Check, CheckContext};
use crate::error::ProviderResult;
use crate::finding::{Category, Finding};
use crate::model::{Manifest, ReleasePlan, Target};

pub struct ManifestVersionCheck;

/// Compare `manifest` against the versions in `plan`.
pub fn compare_manifest(plan: &ReleasePlan, manifest: &Manifest) -> Vec<Finding> {
    let mut findings = Vec::new();
    let umbrella = &plan.umbrella;

    if manifest.version != umbrella.expected_version {
        findings.push(Finding::error(
            Category::ManifestVersion,
            &umbrella.name,
            format!(
                "manifest declares umbrella version \"{}\", expected \"{}\"",
                manifest.version, umbrella.expected_version
            ),
        ));
    }

    for component in &plan.components {
        let entries = manifest.entries_for(&component.name);
        match entries.as_slice() {
            [] => findings.push(Finding::error(
                Category::ManifestVersion,
                &component.name,
                format!(
                    "missing from manifest (expected version \"{}\")",
                    component.expected_version
                ),
            )),
            [entry] => {
                if entry.version != component.expected_version {
                    findings.push(Finding::error(
                        Category::ManifestVersion,
                        &component.name,
                        format!(
                            "manifest declares version \"{}\", expected \"{}\"",
                            entry.version, component.expected_version
                        ),
                    ));
                }
            }
            many => findings.push(Finding::error(
                Category::ManifestVersion,
                &component.name,
                format!(
                    "found {} manifest entries (versions {}), expected exactly one at \"{}\"",
                    many.len(),
                    many.iter()
                        .map(|e| format!("\"{}\"", e.version))
                        .collect::<Vec<_>>()
                        .join(", "),
                    component.expected_version
                ),
            )),
        }
    }

    let configured: BTreeSet<String> = plan
        .components
        .iter()
        .map(|c| c.name.to_ascii_lowercase())
        .collect();
    let mut reported = BTreeSet::new();
    for entry in &manifest.dependencies {
        let key = entry.name.to_ascii_lowercase();
        if configured.contains(&key) || !reported.insert(key) {
            continue;
        }
        findings.push(Finding::error(
            Category::ManifestVersion,
            &entry.name,
            format!(
                "manifest declares version \"{}\" but no expected version is configured",
                entry.version
            ),
        ));
    }

    findings
}

#[async_trait]
impl Check for ManifestVersionCheck {
    fn name(&self) -> &'static str {
        "manifest-version"
    }

    fn category(&self) -> Category {
        Category::ManifestVersion
    }

    fn targets(&self, _plan: &ReleasePlan) -> Vec<Target> {
        vec![Target::Umbrella]
    }

    async fn evaluate(&self, ctx: &CheckContext, _target: &Target) -> ProviderResult<Vec<Finding>> {
        Ok(compare_manifest(ctx.plan(), ctx.manifest()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{fixture_manifest, fixture_plan};
    use crate::model::ManifestEntry;

    #[test]
    fn test_matching_manifest_yields_nothing() {
        let plan = fixture_plan();
        assert!(compare_manifest(&plan, &fixture_manifest(&plan)).is_empty());
    }

    #[test]
    fn test_version_mismatch_cites_both_values() {
        let plan = fixture_plan();
        let mut manifest = fixture_manifest(&plan);
        for dep in manifest.dependencies.iter_mut() {
            if dep.name == "coreMQTT" {
                dep.version = "v1.0.0".to_string();
            }
        }
        let findings = compare_manifest(&plan, &manifest);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "coremqtt");
        assert!(findings[0].message.contains("\"v1.0.1\""));
        assert!(findings[0].message.contains("\"v1.0.0\""));
    }

    #[test]
    fn test_missing_v_prefix_is_a_mismatch() {
        let plan = fixture_plan();
        let mut manifest = fixture_manifest(&plan);
        manifest.dependencies[0].version = manifest.dependencies[0].version.trim_start_matches('v').to_string();
        assert_eq!(compare_manifest(&plan, &manifest).len(), 1);
    }

    #[test]
    fn test_component_absent_from_manifest() {
        let plan = fixture_plan();
        let mut manifest = fixture_manifest(&plan);
        manifest.dependencies.retain(|d| d.name != "coreJSON");
        let findings = compare_manifest(&plan, &manifest);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "corejson");
        assert!(findings[0].message.contains("missing from manifest"));
    }

    #[test]
    fn test_unconfigured_manifest_entry_is_reported_once() {
        let plan = fixture_plan();
        let mut manifest = fixture_manifest(&plan);
        let extra = ManifestEntry {
            name: "coreHTTP".to_string(),
            version: "v1.0.0".to_string(),
            repository_url: None,
        };
        manifest.dependencies.push(extra.clone());
        manifest.dependencies.push(extra);
        let findings = compare_manifest(&plan, &manifest);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "coreHTTP");
    }

    #[test]
    fn test_duplicate_entries_report_occurrence_count() {
        let plan = fixture_plan();
        let mut manifest = fixture_manifest(&plan);
        let dup = manifest.dependencies[0].clone();
        manifest.dependencies.push(dup);
        let findings = compare_manifest(&plan, &manifest);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("found 2 manifest entries"));
    }

    #[test]
    fn test_umbrella_version_mismatch() {
        let plan = fixture_plan();
        let mut manifest = fixture_manifest(&plan);
        manifest.version = "202009.00".to_string();
        let findings = compare_manifest(&plan, &manifest);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, plan.umbrella.name);
        assert!(findings[0].message.contains("202009.00"));
        assert!(findings[0].message.contains("202012.00"));
    }
}
