//! Change detection against the registry
//!
//! Two-stage decision: compare the local manifest version with the latest
//! published version, and only when they match fall through to comparing
//! tarball fingerprints. A package the registry has never seen is a positive
//! "first publish" verdict, not an error.

use crate::core::error::PublishError;
use crate::core::manifest::PackageManifest;
use crate::core::traits::{ProcessRunner, PublishedRelease, RegistryClient, RunContext};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Reason reported when nothing needs publishing
pub const NO_CHANGES_REASON: &str = "No changes detected";

/// Reason reported for a package the registry does not know yet
pub const FIRST_PUBLISH_REASON: &str = "Package not found in registry - first publish";

/// Verdict of a detection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeResult {
    pub changed: bool,
    pub reason: String,
}

impl ChangeResult {
    fn changed(reason: impl Into<String>) -> Self {
        Self {
            changed: true,
            reason: reason.into(),
        }
    }

    fn unchanged() -> Self {
        Self {
            changed: false,
            reason: NO_CHANGES_REASON.to_string(),
        }
    }
}

/// Summary entry emitted by `npm pack --dry-run --json`
#[derive(Debug, Deserialize)]
struct PackSummary {
    integrity: Option<String>,
    shasum: Option<String>,
}

/// Decides whether the local package differs from its published form
pub struct ChangeDetector {
    registry: Arc<dyn RegistryClient>,
    runner: Arc<dyn ProcessRunner>,
}

impl ChangeDetector {
    pub fn new(registry: Arc<dyn RegistryClient>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { registry, runner }
    }

    /// Detect whether the package at `cwd` needs publishing
    ///
    /// Read-only: one registry query plus, when versions match, one
    /// `npm pack --dry-run` to fingerprint the local artifact.
    pub async fn detect(&self, cwd: &Path) -> Result<ChangeResult, PublishError> {
        let manifest = PackageManifest::load(cwd).await?;
        self.detect_for(cwd, &manifest).await
    }

    /// Detect with an already-loaded manifest
    pub async fn detect_for(
        &self,
        cwd: &Path,
        manifest: &PackageManifest,
    ) -> Result<ChangeResult, PublishError> {
        let local = manifest.parsed_version(cwd)?;

        let release = self
            .registry
            .published_release(&manifest.name)
            .await
            .map_err(|e| PublishError::lookup(&manifest.name, &e))?;

        let Some(release) = release else {
            return Ok(ChangeResult::changed(FIRST_PUBLISH_REASON));
        };

        if release.version != local {
            return Ok(ChangeResult::changed(format!(
                "Version differs: local {} vs registry {}",
                local, release.version
            )));
        }

        self.compare_fingerprints(cwd, manifest, &release).await
    }

    async fn compare_fingerprints(
        &self,
        cwd: &Path,
        manifest: &PackageManifest,
        release: &PublishedRelease,
    ) -> Result<ChangeResult, PublishError> {
        let local = self.pack_fingerprint(cwd, manifest).await?;

        let matches = match (&local.integrity, &release.integrity) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => match (&local.shasum, &release.shasum) {
                (Some(ours), Some(theirs)) => ours == theirs,
                // Neither side offers a comparable fingerprint; the verdict
                // would be a guess, so fail the lookup instead.
                _ => {
                    return Err(PublishError::Lookup {
                        package: manifest.name.clone(),
                        message: format!(
                            "no comparable fingerprint for published {}",
                            release.version
                        ),
                    });
                }
            },
        };

        if matches {
            Ok(ChangeResult::unchanged())
        } else {
            Ok(ChangeResult::changed(format!(
                "Contents differ from published {}",
                release.version
            )))
        }
    }

    /// Fingerprint the local artifact as npm would pack it
    async fn pack_fingerprint(
        &self,
        cwd: &Path,
        manifest: &PackageManifest,
    ) -> Result<PackSummary, PublishError> {
        let args = vec![
            "pack".to_string(),
            "--dry-run".to_string(),
            "--json".to_string(),
        ];
        let ctx = RunContext::new(cwd).quiet();

        let stdout = self
            .runner
            .run_capture("npm", &args, &ctx)
            .await
            .map_err(|e| PublishError::Lookup {
                package: manifest.name.clone(),
                message: format!("npm pack failed: {}", e),
            })?;

        let mut summaries: Vec<PackSummary> =
            serde_json::from_str(&stdout).map_err(|e| PublishError::Lookup {
                package: manifest.name.clone(),
                message: format!("unparseable npm pack output: {}", e),
            })?;

        if summaries.is_empty() {
            return Err(PublishError::Lookup {
                package: manifest.name.clone(),
                message: "npm pack reported no artifact".to_string(),
            });
        }
        Ok(summaries.remove(0))
    }
}

/// Detect changes with the production registry client and subprocess runner
pub async fn detect_changes(cwd: &Path) -> Result<ChangeResult, PublishError> {
    let runner = Arc::new(crate::exec::CommandRunner::new());
    let registry = Arc::new(crate::registry::NpmRegistryClient::new(cwd));
    ChangeDetector::new(registry, runner).detect(cwd).await
}
