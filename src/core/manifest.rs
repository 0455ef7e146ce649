//! Package manifest loading
//!
//! The pipeline reads `package.json` at most twice per invocation: once at
//! entry and once after the external version bump rewrites it on disk.

use crate::core::error::PublishError;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Manifest file name at the project root
pub const MANIFEST_FILE: &str = "package.json";

/// The slice of `package.json` this tool cares about
///
/// Unknown fields are ignored on load and never written back; the manifest is
/// only mutated on disk by the external `npm version` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub private: bool,
}

impl PackageManifest {
    /// Load the manifest from `<cwd>/package.json`
    pub async fn load(cwd: &Path) -> Result<Self, PublishError> {
        let path = cwd.join(MANIFEST_FILE);
        let content =
            fs::read_to_string(&path)
                .await
                .map_err(|e| PublishError::ManifestRead {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

        serde_json::from_str(&content).map_err(|e| PublishError::ManifestRead {
            path,
            message: e.to_string(),
        })
    }

    /// Parse the declared version as semver
    pub fn parsed_version(&self, cwd: &Path) -> Result<Version, PublishError> {
        Version::parse(&self.version).map_err(|e| PublishError::ManifestRead {
            path: cwd.join(MANIFEST_FILE),
            message: format!("invalid version `{}`: {}", self.version, e),
        })
    }
}
