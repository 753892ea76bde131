//! `csdk-release-verify`: release gate for the CSDK umbrella repository.
//!
//! Checks library CI, umbrella pipelines, branch hygiene, manifest versions
//! and pending pull requests, then writes `error.log` and
//! `docs_to_review.txt` to the output directory.
//!
//! Exit status: 0 when the candidate passes, 1 when it fails, 2 when the run
//! could not complete (no reports are written).

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use csdk_release_adapters::{
    FsDocumentLocator, GithubClient, GithubConfig, JenkinsClient, JenkinsConfig, RoutingCiProvider,
    YamlManifestReader,
};
use csdk_release_core::{
    write_reports, write_run_summary_json, Aggregate, CheckRegistry, CheckRunner, CiProvider,
    ManifestProvider, Providers, RunSummaryArtifact, RunnerConfig, Verdict, VerifyError, VerifySpan,
};
use tracing::{info, Level};

use crate::config::{ReleaseConfig, DEFAULT_CONFIG_PATH, GITHUB_TOKEN_ENV};

#[derive(Parser, Debug)]
#[command(name = "csdk-release-verify")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify that a CSDK release candidate is ready to ship", long_about = None)]
struct Cli {
    /// CSDK repository root
    #[arg(short, long)]
    root: PathBuf,

    /// Release config (default: <root>/tools/release/config.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for error.log and docs_to_review.txt
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Timeout for each provider call, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Maximum number of checks evaluated at once
    #[arg(long, default_value_t = 8)]
    max_concurrency: usize,

    /// Skip TLS certificate verification for the Jenkins server
    #[arg(long)]
    disable_jenkins_server_verify: bool,

    /// Also write a JSON run summary to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    csdk_release_core::init_tracing(cli.json, level);

    match run(&cli).await {
        Ok(Verdict::Pass) => {
            println!("All release verification passed.");
            ExitCode::SUCCESS
        }
        Ok(Verdict::Fail) => {
            println!(
                "Release verification failed, see {}",
                cli.output_dir.join(csdk_release_core::report::ERROR_LOG).display()
            );
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> Result<Verdict> {
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("CSDK root {} is not accessible", cli.root.display()))?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_PATH));
    let config = ReleaseConfig::load(&config_path)?;
    config.validate()?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    let github_token = config.github_token(std::env::var(GITHUB_TOKEN_ENV).ok())?;
    let jenkins = config.jenkins()?;

    let mut secrets = vec![github_token.expose().to_string()];
    if let Some(creds) = &jenkins {
        secrets.push(creds.password.expose().to_string());
    }

    // Repositories may come from the manifest, so it is read before the plan exists.
    let manifest_reader = Arc::new(YamlManifestReader::new());
    let manifest = manifest_reader
        .read_manifest(&root.join(&config.manifest_path))
        .await
        .map_err(|e| {
            VerifyError::ConfigurationIncomplete(format!(
                "cannot read manifest {}: {e}",
                config.manifest_path.display()
            ))
        })?;
    let plan = config.build_plan(&root, &manifest)?;

    let github = Arc::new(
        GithubClient::new(
            GithubConfig::new(github_token)
                .with_api_url(config.github_api_url.clone())
                .with_timeout(timeout),
        )
        .map_err(|e| VerifyError::ProviderUnavailable(e.to_string()))?,
    );
    let pipeline_ci: Arc<dyn CiProvider> = match jenkins {
        Some(creds) => Arc::new(
            JenkinsClient::new(
                JenkinsConfig::new(creds.url, creds.username, creds.password)
                    .with_verify_tls(!cli.disable_jenkins_server_verify)
                    .with_timeout(timeout),
            )
            .map_err(|e| VerifyError::ProviderUnavailable(e.to_string()))?,
        ),
        None => github.clone(),
    };
    let providers = Providers::new(
        github.clone(),
        Arc::new(RoutingCiProvider::new(github.clone(), pipeline_ci)),
        manifest_reader,
        Arc::new(FsDocumentLocator::new()),
    );

    let runner = CheckRunner::new(
        CheckRegistry::standard(),
        providers,
        RunnerConfig {
            call_timeout: timeout,
            max_concurrency: cli.max_concurrency.max(1),
            secrets,
        },
    );

    let run_id = uuid::Uuid::new_v4().to_string();
    let _span = VerifySpan::enter(&run_id);
    info!(root = %root.display(), config = %config_path.display(), "starting release verification");

    let result = runner.verify(&plan).await?;
    publish(cli, &run_id, &result)?;

    Ok(result.verdict)
}

/// Write the reports, and the JSON summary when requested.
fn publish(cli: &Cli, run_id: &str, result: &Aggregate) -> Result<()> {
    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("cannot create output directory {}", cli.output_dir.display()))?;
    write_reports(&cli.output_dir, result)?;

    if let Some(path) = &cli.summary_json {
        write_summary(path, run_id, result)?;
    }
    Ok(())
}

fn write_summary(path: &Path, run_id: &str, result: &Aggregate) -> Result<()> {
    let artifact = RunSummaryArtifact::new(run_id, chrono::Utc::now(), result);
    write_run_summary_json(path, &artifact)
}
