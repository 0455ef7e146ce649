//! Core ports for conditional publishing
//!
//! This module defines the capability interfaces the pipeline and the change
//! detector depend on: registry lookup, subprocess execution, and version
//! control. Production implementations live in `registry` and `exec`; tests
//! substitute fakes so no network or subprocess access is needed.

use crate::core::error::RegistryError;
use crate::exec::CommandError;
use async_trait::async_trait;
use semver::Version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The latest release the registry knows for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRelease {
    /// Version behind the `latest` dist-tag
    pub version: Version,
    /// Subresource-integrity string of the published tarball (sha512)
    pub integrity: Option<String>,
    /// Legacy sha1 hex digest of the published tarball
    pub shasum: Option<String>,
}

/// How subprocess output is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Inherit the parent's stdout/stderr (interactive use)
    #[default]
    Inherit,
    /// Capture and discard unless the command fails
    Quiet,
}

/// Per-invocation context forwarded to every subprocess
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Working directory for the command
    pub cwd: PathBuf,
    /// Extra environment variables layered over the parent environment
    pub env: HashMap<String, String>,
    /// Output-stream behavior
    pub stdio: StdioMode,
}

impl RunContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: HashMap::new(),
            stdio: StdioMode::default(),
        }
    }

    /// Same context with captured-and-discarded output
    pub fn quiet(mut self) -> Self {
        self.stdio = StdioMode::Quiet;
        self
    }
}

/// Read-only registry lookup
///
/// `Ok(None)` means the registry has never seen the package; the change
/// detector maps that to a first-publish verdict instead of an error.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn published_release(
        &self,
        name: &str,
    ) -> Result<Option<PublishedRelease>, RegistryError>;
}

/// Blocking subprocess execution
///
/// Each call runs one command to completion; the pipeline imposes no timeout,
/// so a hung subprocess hangs the invocation.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command, surfacing output per the context's stdio mode
    async fn run(
        &self,
        program: &str,
        args: &[String],
        ctx: &RunContext,
    ) -> Result<(), CommandError>;

    /// Run a command and return its captured stdout
    async fn run_capture(
        &self,
        program: &str,
        args: &[String],
        ctx: &RunContext,
    ) -> Result<String, CommandError>;
}

/// Version-control operations used by the commit step
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Stage every change under the working directory
    async fn stage_all(&self, ctx: &RunContext) -> Result<(), CommandError>;

    /// Create a commit with the given message
    async fn commit(&self, ctx: &RunContext, message: &str) -> Result<(), CommandError>;
}

/// Recursive delete of a directory, absent-is-ok
///
/// Used by the test phase to drop `node_modules` before a clean install.
pub async fn remove_dir_recursive(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_context_defaults() {
        let ctx = RunContext::new("/tmp/project");

        assert_eq!(ctx.cwd, PathBuf::from("/tmp/project"));
        assert!(ctx.env.is_empty());
        assert_eq!(ctx.stdio, StdioMode::Inherit);
    }

    #[test]
    fn test_run_context_quiet() {
        let ctx = RunContext::new(".").quiet();
        assert_eq!(ctx.stdio, StdioMode::Quiet);
    }

    #[tokio::test]
    async fn test_remove_dir_recursive() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("node_modules");
        tokio::fs::create_dir_all(target.join("dep")).await.unwrap();
        tokio::fs::write(target.join("dep").join("index.js"), "x")
            .await
            .unwrap();

        remove_dir_recursive(&target).await.unwrap();
        assert!(!target.exists());

        // absent directory is not an error
        remove_dir_recursive(&target).await.unwrap();
    }
}
