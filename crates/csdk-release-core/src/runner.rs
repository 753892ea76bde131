//! Check registry and runner.
//!
//! [`CheckRunner::run_all`] validates the plan, probes the providers, reads
//! the manifest once, then expands every registered check into per-target
//! units and evaluates them concurrently. Each unit returns its own batch of
//! findings; batches are merged by unit index once all units finish, so the
//! emitted sequence never depends on provider response timing.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregator::{aggregate, Aggregate};
use crate::checks::{
    BranchPolicyCheck, Check, CheckContext, CiPipelineCheck, DocReviewCheck, ManifestVersionCheck,
    PullRequestCheck, TestsAndQualityCheck,
};
use crate::error::{ProviderError, VerifyError, VerifyResult};
use crate::finding::{Category, Finding};
use crate::model::{Manifest, ReleasePlan, Target};
use crate::obs;
use crate::provider::Providers;
use crate::redact::redact;

/// Ordered collection of checks to run.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every release check, in report order.
    pub fn standard() -> Self {
        Self::empty()
            .with_check(TestsAndQualityCheck)
            .with_check(CiPipelineCheck)
            .with_check(BranchPolicyCheck)
            .with_check(ManifestVersionCheck)
            .with_check(PullRequestCheck)
            .with_check(DocReviewCheck)
    }

    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Drop every check filed under `category`.
    pub fn without(mut self, category: Category) -> Self {
        self.checks.retain(|c| c.category() != category);
        self
    }

    pub fn checks(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Runner tuning.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on every single provider call.
    pub call_timeout: Duration,
    /// Maximum check units evaluated at once.
    pub max_concurrency: usize,
    /// Credential values that must never appear in findings.
    pub secrets: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            max_concurrency: 8,
            secrets: Vec::new(),
        }
    }
}

/// Executes a [`CheckRegistry`] against a [`ReleasePlan`].
pub struct CheckRunner {
    registry: CheckRegistry,
    providers: Providers,
    config: RunnerConfig,
}

struct Unit {
    check: Arc<dyn Check>,
    target: Target,
}

impl CheckRunner {
    pub fn new(registry: CheckRegistry, providers: Providers, config: RunnerConfig) -> Self {
        Self {
            registry,
            providers,
            config,
        }
    }

    /// Run every check and aggregate the result.
    pub async fn verify(&self, plan: &ReleasePlan) -> VerifyResult<Aggregate> {
        let started = Instant::now();
        obs::emit_verify_started(&plan.umbrella.name, plan.components.len(), self.registry.len());
        let findings = self.run_all(plan).await?;
        let result = aggregate(findings);
        obs::emit_verify_finished(
            result.verdict,
            result.error_count(),
            result.review_item_count(),
            started.elapsed(),
        );
        Ok(result)
    }

    /// Run every registered check and return findings in emission order.
    ///
    /// Fails only for conditions that make the whole run meaningless: an
    /// invalid plan, an unreachable provider, or an unreadable manifest.
    pub async fn run_all(&self, plan: &ReleasePlan) -> VerifyResult<Vec<Finding>> {
        validate_plan(plan)?;
        self.probe_providers().await?;
        let manifest = self.load_manifest(plan).await?;

        let ctx = CheckContext::new(
            Arc::new(plan.clone()),
            Arc::new(manifest),
            self.providers.clone(),
            self.config.call_timeout,
            Arc::new(self.config.secrets.clone()),
        );

        let units: Vec<Unit> = self
            .registry
            .checks()
            .iter()
            .flat_map(|check| {
                check.targets(plan).into_iter().map(|target| Unit {
                    check: Arc::clone(check),
                    target,
                })
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        for (idx, unit) in units.iter().enumerate() {
            let check = Arc::clone(&unit.check);
            let target = unit.target.clone();
            let ctx = ctx.clone();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let started = Instant::now();
                let outcome = AssertUnwindSafe(check.evaluate(&ctx, &target))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(ProviderError::Request("check evaluation panicked".to_string()))
                    });
                (idx, outcome, started.elapsed())
            });
        }

        let mut batches: Vec<Option<Vec<Finding>>> = vec![None; units.len()];
        while let Some(joined) = join_set.join_next().await {
            let Ok((idx, outcome, elapsed)) = joined else {
                // Cancelled tasks leave their slot empty; filled in below.
                continue;
            };
            let unit = &units[idx];
            let subject = unit.target.subject(plan);
            let batch = match outcome {
                Ok(findings) => {
                    obs::emit_check_completed(unit.check.name(), subject, findings.len(), elapsed);
                    findings
                }
                Err(err) => {
                    let reason = self.redacted(&err.to_string());
                    obs::emit_check_unit_failed(unit.check.name(), subject, &reason);
                    vec![unit_failure(unit, subject, &reason)]
                }
            };
            batches[idx] = Some(batch);
        }

        Ok(units
            .iter()
            .zip(batches)
            .flat_map(|(unit, batch)| {
                batch.unwrap_or_else(|| {
                    vec![unit_failure(
                        unit,
                        unit.target.subject(plan),
                        "evaluation did not complete",
                    )]
                })
            })
            .collect())
    }

    async fn probe_providers(&self) -> VerifyResult<()> {
        let timeout = self.config.call_timeout;
        let vcs = tokio::time::timeout(timeout, self.providers.vcs.probe())
            .await
            .unwrap_or(Err(ProviderError::Timeout(timeout)));
        if let Err(err) = vcs {
            return Err(VerifyError::ProviderUnavailable(format!(
                "version control: {}",
                self.redacted(&err.to_string())
            )));
        }
        let ci = tokio::time::timeout(timeout, self.providers.ci.probe())
            .await
            .unwrap_or(Err(ProviderError::Timeout(timeout)));
        if let Err(err) = ci {
            return Err(VerifyError::ProviderUnavailable(format!(
                "ci: {}",
                self.redacted(&err.to_string())
            )));
        }
        Ok(())
    }

    async fn load_manifest(&self, plan: &ReleasePlan) -> VerifyResult<Manifest> {
        let path = plan.root.join(&plan.umbrella.manifest_path);
        let timeout = self.config.call_timeout;
        let read = tokio::time::timeout(timeout, self.providers.manifest.read_manifest(&path))
            .await
            .unwrap_or(Err(ProviderError::Timeout(timeout)));
        match read {
            Ok(manifest) => Ok(manifest),
            Err(err @ ProviderError::Unavailable { .. }) => Err(VerifyError::ProviderUnavailable(
                self.redacted(&err.to_string()),
            )),
            Err(err) => Err(VerifyError::ConfigurationIncomplete(format!(
                "cannot read manifest {}: {}",
                path.display(),
                self.redacted(&err.to_string())
            ))),
        }
    }

    fn redacted(&self, text: &str) -> String {
        let secrets: Vec<&str> = self.config.secrets.iter().map(String::as_str).collect();
        redact(text, &secrets)
    }
}

fn unit_failure(unit: &Unit, subject: &str, reason: &str) -> Finding {
    Finding::error(
        unit.check.category(),
        subject,
        format!("{} check could not be evaluated: {reason}", unit.check.name()),
    )
}

/// Reject plans no check could meaningfully run against.
pub fn validate_plan(plan: &ReleasePlan) -> VerifyResult<()> {
    let incomplete = |msg: String| Err(VerifyError::ConfigurationIncomplete(msg));

    if plan.umbrella.name.trim().is_empty() || plan.umbrella.repository.slug.trim().is_empty() {
        return incomplete("umbrella repository is not configured".to_string());
    }
    if plan.umbrella.expected_version.trim().is_empty() {
        return incomplete("umbrella version is empty".to_string());
    }
    if plan.components.is_empty() {
        return incomplete("no components are configured".to_string());
    }

    let mut seen = BTreeSet::new();
    for component in &plan.components {
        if component.name.trim().is_empty() {
            return incomplete("a component has an empty name".to_string());
        }
        if !seen.insert(component.name.to_ascii_lowercase()) {
            return incomplete(format!("component {} is configured twice", component.name));
        }
        if component.expected_version.trim().is_empty() {
            return incomplete(format!("component {} has no expected version", component.name));
        }
        if component.repository.slug.trim().is_empty() {
            return incomplete(format!("component {} has no repository", component.name));
        }
    }
    Ok(())
}
