//! Error handling for conditional publishing
//!
//! This module provides the error taxonomy for the publish pipeline and the
//! registry lookup, using the thiserror crate for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for publish pipeline operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Manifest errors
    #[error("Failed to read package manifest at {path}: {message}")]
    ManifestRead { path: PathBuf, message: String },

    // Registry errors
    #[error("Registry lookup failed for {package}: {message}")]
    Lookup { package: String, message: String },

    // Configuration errors
    #[error("Failed to load configuration from {path}: {message}")]
    Config { path: PathBuf, message: String },

    // Test phase errors
    #[error("Test phase failed at `{step}`: {message}")]
    Test { step: String, message: String },

    // Version bump errors
    #[error("Version bump `{bump}` failed: {message}")]
    Version { bump: String, message: String },

    // Deliberate guard, not a bug
    #[error("Cannot publish in test environment without --dry-run")]
    SafetyGate,

    // Publishing errors
    #[error("Publish failed: {message}")]
    Publish { message: String },

    // Commit errors (reported as warnings by the pipeline, never propagated)
    #[error("Commit failed: {message}")]
    Commit { message: String },
}

impl PublishError {
    /// Get the stable error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ManifestRead { .. } => "MANIFEST_READ",
            Self::Lookup { .. } => "LOOKUP_FAILED",
            Self::Config { .. } => "CONFIG_INVALID",
            Self::Test { .. } => "TEST_FAILED",
            Self::Version { .. } => "VERSION_FAILED",
            Self::SafetyGate => "SAFETY_GATE",
            Self::Publish { .. } => "PUBLISH_FAILED",
            Self::Commit { .. } => "COMMIT_FAILED",
        }
    }

    /// Check whether this error aborts the pipeline when raised by a step
    ///
    /// Only the commit step is best-effort; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Commit { .. })
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ManifestRead { .. } => vec![
                "package.jsonが存在するか確認してください",
                "name/versionフィールドを確認してください",
            ],
            Self::Lookup { .. } => vec![
                "ネットワーク接続を確認してください",
                ".npmrcのレジストリ設定を確認してください",
            ],
            Self::Config { .. } => {
                vec![".autopublish.ymlの構文を確認してください"]
            }
            Self::Test { .. } => vec![
                "テストの出力を確認してください",
                "依存関係を再インストールしてください",
            ],
            Self::Version { .. } => {
                vec!["patch/minor/major、またはSemVer形式（例: 1.0.0）で指定してください"]
            }
            Self::SafetyGate => {
                vec!["--dry-runオプションを指定してください"]
            }
            Self::Publish { .. } => vec![
                "エラーメッセージを確認してください",
                "認証情報とOTPを確認してください",
            ],
            Self::Commit { .. } => {
                vec!["gitの状態を確認し、手動でコミットしてください"]
            }
        }
    }

    /// Wrap a registry failure for the named package
    pub fn lookup(package: impl Into<String>, error: &RegistryError) -> Self {
        Self::Lookup {
            package: package.into(),
            message: error.to_string(),
        }
    }
}

/// Errors from the registry lookup port
///
/// Not-found is intentionally NOT an error: `RegistryClient` reports it as
/// `Ok(None)` so the change detector can map a first publish to a positive
/// verdict. Everything here aborts the pipeline as `PublishError::Lookup`.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry request failed: {message}")]
    Http { message: String },

    #[error("Registry returned HTTP {status} for {package}")]
    Status { status: u16, package: String },

    #[error("Malformed registry response: {message}")]
    Malformed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_gate_message() {
        let error = PublishError::SafetyGate;

        assert_eq!(
            error.to_string(),
            "Cannot publish in test environment without --dry-run"
        );
        assert_eq!(error.code(), "SAFETY_GATE");
        assert!(error.is_fatal());
    }

    #[test]
    fn test_manifest_read_error() {
        let error = PublishError::ManifestRead {
            path: PathBuf::from("/tmp/pkg/package.json"),
            message: "No such file or directory".to_string(),
        };

        assert_eq!(error.code(), "MANIFEST_READ");
        assert!(error.is_fatal());
        let display = error.to_string();
        assert!(display.contains("package.json"));
        assert!(display.contains("No such file"));
    }

    #[test]
    fn test_commit_error_is_not_fatal() {
        let error = PublishError::Commit {
            message: "nothing to commit".to_string(),
        };

        assert!(!error.is_fatal());
        assert_eq!(error.code(), "COMMIT_FAILED");
    }

    #[test]
    fn test_test_error_names_step() {
        let error = PublishError::Test {
            step: "npm ci".to_string(),
            message: "exit status 1".to_string(),
        };

        assert!(error.to_string().contains("npm ci"));
        assert_eq!(error.code(), "TEST_FAILED");
    }

    #[test]
    fn test_lookup_wraps_registry_error() {
        let registry_error = RegistryError::Status {
            status: 503,
            package: "some-package".to_string(),
        };
        let error = PublishError::lookup("some-package", &registry_error);

        assert_eq!(error.code(), "LOOKUP_FAILED");
        assert!(error.to_string().contains("some-package"));
        assert!(error.to_string().contains("503"));
    }

    #[test]
    fn test_suggested_actions_non_empty() {
        let errors = [
            PublishError::SafetyGate,
            PublishError::Publish {
                message: "403".to_string(),
            },
            PublishError::Version {
                bump: "bogus".to_string(),
                message: "unknown bump kind".to_string(),
            },
        ];

        for error in errors {
            assert!(!error.suggested_actions().is_empty());
        }
    }
}
