//! Publish pipeline orchestration
//!
//! Runs the conditional-publish workflow for one project directory:
//! skip-if-private, change detection, optional test phase, version bump,
//! safety gate, publish, commit. Steps execute strictly one at a time and
//! the first failing step aborts the rest; only the commit step is
//! best-effort.

use crate::core::error::PublishError;
use crate::core::manifest::PackageManifest;
use crate::core::traits::{
    ProcessRunner, RegistryClient, RunContext, StdioMode, VersionControl, remove_dir_recursive,
};
use crate::detection::ChangeDetector;
use crate::pipeline::args::{PublishArgs, is_valid_bump};
use crate::pipeline::state::{PipelineState, StateTracker, StateTransition};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Environment variable that marks an automated test run
const TEST_ENV_VAR: &str = "NODE_ENV";
const TEST_ENV_VALUE: &str = "test";

/// Per-invocation pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Working directory; the process current directory when absent
    pub cwd: Option<PathBuf>,

    /// Pre-loaded manifest, avoiding the entry read
    pub package: Option<PackageManifest>,

    /// Extra environment variables forwarded to every subprocess; also
    /// consulted (before the process environment) by the safety gate
    pub env: HashMap<String, String>,

    /// Output-stream behavior for subprocess steps
    pub stdio: StdioMode,
}

impl PipelineOptions {
    pub fn effective_cwd(&self) -> PathBuf {
        self.cwd
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

/// Terminal outcome of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Manifest declares `private`; nothing was attempted
    SkippedPrivate,
    /// Detector found no difference against the registry
    SkippedUnchanged,
    /// Publish step ran; `committed` is false when the best-effort commit
    /// step failed after the publish
    Published { committed: bool },
}

/// Result of a completed pipeline run
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub package_name: String,
    /// Final manifest version (post-bump when a publish happened)
    pub version: String,
    pub outcome: PublishOutcome,
    /// Detector verdict or skip explanation
    pub reason: String,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
    pub history: Vec<StateTransition>,
}

/// Ordered side-effecting steps; built once per invocation, drained
/// sequentially with concurrency 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    RemoveNodeModules,
    CleanInstall,
    RunTests,
    BumpVersion,
    SafetyGate,
    Publish,
    Commit,
}

impl Step {
    fn state(self) -> PipelineState {
        match self {
            Step::RemoveNodeModules | Step::CleanInstall | Step::RunTests => {
                PipelineState::TestPhase
            }
            Step::BumpVersion => PipelineState::VersionBump,
            Step::SafetyGate => PipelineState::SafetyGate,
            Step::Publish => PipelineState::Publish,
            Step::Commit => PipelineState::Commit,
        }
    }
}

/// Conditional publish orchestrator over injected capability ports
pub struct PublishPipeline {
    registry: Arc<dyn RegistryClient>,
    runner: Arc<dyn ProcessRunner>,
    vcs: Arc<dyn VersionControl>,
}

impl PublishPipeline {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        runner: Arc<dyn ProcessRunner>,
        vcs: Arc<dyn VersionControl>,
    ) -> Self {
        Self {
            registry,
            runner,
            vcs,
        }
    }

    /// Run the pipeline once
    ///
    /// Returns exactly one terminal result: a report on success (including
    /// the skip outcomes) or the first fatal step error.
    pub async fn publish(
        &self,
        args: &PublishArgs,
        options: PipelineOptions,
    ) -> Result<PublishReport, PublishError> {
        let started = Instant::now();
        let cwd = options.effective_cwd();
        let mut tracker = StateTracker::new();
        let mut warnings = Vec::new();

        // Entry read, skipped when the caller supplies the manifest
        let mut manifest = match options.package.clone() {
            Some(manifest) => manifest,
            None => PackageManifest::load(&cwd).await?,
        };

        tracker.transition(PipelineState::PrivacyCheck);
        if manifest.private {
            println!("⏭️  Skipping {}. Private", manifest.name);
            tracker.transition(PipelineState::Done);
            return Ok(Self::report(
                manifest,
                PublishOutcome::SkippedPrivate,
                "private package".to_string(),
                warnings,
                started,
                tracker,
            ));
        }

        tracker.transition(PipelineState::DetectChange);
        let detector = ChangeDetector::new(self.registry.clone(), self.runner.clone());
        let change = detector.detect_for(&cwd, &manifest).await?;

        if !change.changed {
            println!("⏭️  Skipping {}. {}", manifest.name, change.reason);
            tracker.transition(PipelineState::Done);
            return Ok(Self::report(
                manifest,
                PublishOutcome::SkippedUnchanged,
                change.reason,
                warnings,
                started,
                tracker,
            ));
        }

        println!("📦 Publishing {}. {}", manifest.name, change.reason);

        let bump = args.bump_or_default().to_string();
        if !is_valid_bump(&bump) {
            return Err(PublishError::Version {
                bump,
                message: "expected patch, minor, major, or an explicit semver version"
                    .to_string(),
            });
        }

        let ctx = RunContext {
            cwd: cwd.clone(),
            env: options.env.clone(),
            stdio: options.stdio,
        };

        let mut steps = Vec::new();
        if !args.yolo {
            steps.push(Step::RemoveNodeModules);
            steps.push(Step::CleanInstall);
            steps.push(Step::RunTests);
        }
        steps.push(Step::BumpVersion);
        steps.push(Step::SafetyGate);
        steps.push(Step::Publish);
        steps.push(Step::Commit);

        let mut committed = true;
        for step in steps {
            tracker.transition(step.state());

            match step {
                Step::RemoveNodeModules => {
                    remove_dir_recursive(&ctx.cwd.join("node_modules"))
                        .await
                        .map_err(|e| PublishError::Test {
                            step: "remove node_modules".to_string(),
                            message: e.to_string(),
                        })?;
                }
                Step::CleanInstall => {
                    self.npm(&ctx, &["ci"]).await.map_err(|e| PublishError::Test {
                        step: "npm ci".to_string(),
                        message: e.to_string(),
                    })?;
                }
                Step::RunTests => {
                    self.npm(&ctx, &["test"])
                        .await
                        .map_err(|e| PublishError::Test {
                            step: "npm test".to_string(),
                            message: e.to_string(),
                        })?;
                }
                Step::BumpVersion => {
                    self.npm(&ctx, &["version", bump.as_str()])
                        .await
                        .map_err(|e| PublishError::Version {
                            bump: bump.clone(),
                            message: e.to_string(),
                        })?;
                    // The external tool rewrote the manifest; resynchronize
                    // before the version string is used again.
                    manifest = PackageManifest::load(&cwd).await?;
                }
                Step::SafetyGate => {
                    if Self::is_test_environment(&ctx.env) && !args.dry_run {
                        return Err(PublishError::SafetyGate);
                    }
                }
                Step::Publish => {
                    let mut publish_args = vec!["publish".to_string()];
                    if args.dry_run {
                        publish_args.push("--dry-run".to_string());
                    }
                    if let Some(ref otp) = args.otp {
                        publish_args.push(format!("--otp={}", otp.expose_secret()));
                    }
                    self.runner
                        .run("npm", &publish_args, &ctx)
                        .await
                        .map_err(|e| PublishError::Publish {
                            message: e.to_string(),
                        })?;
                }
                Step::Commit => {
                    // Best-effort: a failed commit after a successful publish
                    // is reported as a warning, never as a pipeline error.
                    if let Err(e) = self.commit_release(&ctx, &manifest.version).await {
                        let warning =
                            format!("published but not committed: {}", e);
                        eprintln!("⚠️  {}", warning);
                        warnings.push(warning);
                        committed = false;
                    }
                }
            }
        }

        tracker.transition(PipelineState::Done);
        println!("✅ Published {}@{}", manifest.name, manifest.version);

        Ok(Self::report(
            manifest,
            PublishOutcome::Published { committed },
            change.reason,
            warnings,
            started,
            tracker,
        ))
    }

    async fn npm(&self, ctx: &RunContext, args: &[&str]) -> Result<(), crate::exec::CommandError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run("npm", &args, ctx).await
    }

    async fn commit_release(
        &self,
        ctx: &RunContext,
        version: &str,
    ) -> Result<(), PublishError> {
        self.vcs
            .stage_all(ctx)
            .await
            .map_err(|e| PublishError::Commit {
                message: e.to_string(),
            })?;
        self.vcs
            .commit(ctx, version)
            .await
            .map_err(|e| PublishError::Commit {
                message: e.to_string(),
            })
    }

    /// Check for automated-test mode, pass-through env first
    fn is_test_environment(env: &HashMap<String, String>) -> bool {
        let value = env
            .get(TEST_ENV_VAR)
            .cloned()
            .or_else(|| std::env::var(TEST_ENV_VAR).ok());
        value.as_deref() == Some(TEST_ENV_VALUE)
    }

    fn report(
        manifest: PackageManifest,
        outcome: PublishOutcome,
        reason: String,
        warnings: Vec<String>,
        started: Instant,
        tracker: StateTracker,
    ) -> PublishReport {
        PublishReport {
            package_name: manifest.name,
            version: manifest.version,
            outcome,
            reason,
            warnings,
            duration_ms: started.elapsed().as_millis() as u64,
            history: tracker.into_history(),
        }
    }
}

/// Run the pipeline with the production ports
pub async fn publish(
    args: &PublishArgs,
    options: PipelineOptions,
) -> Result<PublishReport, PublishError> {
    let cwd = options.effective_cwd();
    let runner = Arc::new(crate::exec::CommandRunner::new());
    let registry = Arc::new(crate::registry::NpmRegistryClient::new(&cwd));
    let vcs = Arc::new(crate::exec::GitCli::new(runner.clone()));
    PublishPipeline::new(registry, runner, vcs)
        .publish(args, options)
        .await
}
