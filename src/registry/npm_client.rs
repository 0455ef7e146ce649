//! Npm registry client
//!
//! Fetches the packument for a package and flattens it to the latest
//! published release plus its tarball fingerprints. A 404 is reported as
//! `Ok(None)`, never as an error.

use crate::core::error::RegistryError;
use crate::core::traits::{PublishedRelease, RegistryClient};
use crate::registry::npmrc::NpmrcConfig;
use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Packument subset returned by `GET {registry}/{name}`
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, VersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    #[serde(default)]
    dist: Option<DistInfo>,
}

#[derive(Debug, Deserialize)]
struct DistInfo {
    integrity: Option<String>,
    shasum: Option<String>,
}

/// Registry client for a single project directory
///
/// The endpoint is resolved per package name: an explicit override wins,
/// otherwise the project's `.npmrc` (including scoped entries) decides.
pub struct NpmRegistryClient {
    http: reqwest::Client,
    project_path: PathBuf,
    registry_override: Option<String>,
}

impl NpmRegistryClient {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            project_path: project_path.into(),
            registry_override: None,
        }
    }

    /// Pin the registry endpoint, bypassing `.npmrc` resolution
    pub fn with_registry(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.registry_override = Some(url.trim_end_matches('/').to_string());
        self
    }

    async fn resolve_registry(&self, package_name: &str) -> String {
        if let Some(ref url) = self.registry_override {
            return url.clone();
        }
        NpmrcConfig::load(&self.project_path)
            .await
            .registry_for(package_name)
    }

    /// Packument URL for a package, slash-escaped for scoped names
    fn packument_url(registry: &str, package_name: &str) -> String {
        format!("{}/{}", registry, package_name.replace('/', "%2F"))
    }

    fn release_from(packument: Packument) -> Result<PublishedRelease, RegistryError> {
        let latest = packument.dist_tags.get("latest").ok_or_else(|| {
            RegistryError::Malformed {
                message: "packument has no latest dist-tag".to_string(),
            }
        })?;

        let version = Version::parse(latest).map_err(|e| RegistryError::Malformed {
            message: format!("latest dist-tag `{}` is not semver: {}", latest, e),
        })?;

        let dist = packument
            .versions
            .get(latest)
            .and_then(|metadata| metadata.dist.as_ref());

        Ok(PublishedRelease {
            version,
            integrity: dist.and_then(|d| d.integrity.clone()),
            shasum: dist.and_then(|d| d.shasum.clone()),
        })
    }
}

#[async_trait]
impl RegistryClient for NpmRegistryClient {
    async fn published_release(
        &self,
        name: &str,
    ) -> Result<Option<PublishedRelease>, RegistryError> {
        let registry = self.resolve_registry(name).await;
        let url = Self::packument_url(&registry, name);

        let response =
            self.http
                .get(&url)
                .send()
                .await
                .map_err(|e| RegistryError::Http {
                    message: e.to_string(),
                })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(RegistryError::Status {
                status: response.status().as_u16(),
                package: name.to_string(),
            });
        }

        let packument =
            response
                .json::<Packument>()
                .await
                .map_err(|e| RegistryError::Malformed {
                    message: e.to_string(),
                })?;

        Self::release_from(packument).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packument(json: &str) -> Packument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_packument_url_plain() {
        assert_eq!(
            NpmRegistryClient::packument_url("https://registry.npmjs.org", "left-pad"),
            "https://registry.npmjs.org/left-pad"
        );
    }

    #[test]
    fn test_packument_url_scoped() {
        assert_eq!(
            NpmRegistryClient::packument_url("https://registry.npmjs.org", "@org/left-pad"),
            "https://registry.npmjs.org/@org%2Fleft-pad"
        );
    }

    #[test]
    fn test_release_from_packument() {
        let packument = packument(
            r#"{
                "dist-tags": {"latest": "1.2.2"},
                "versions": {
                    "1.2.2": {
                        "dist": {
                            "integrity": "sha512-abc",
                            "shasum": "deadbeef",
                            "tarball": "https://registry.npmjs.org/p/-/p-1.2.2.tgz"
                        }
                    }
                }
            }"#,
        );

        let release = NpmRegistryClient::release_from(packument).unwrap();
        assert_eq!(release.version, Version::new(1, 2, 2));
        assert_eq!(release.integrity.as_deref(), Some("sha512-abc"));
        assert_eq!(release.shasum.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_release_without_dist() {
        let packument = packument(r#"{"dist-tags": {"latest": "0.1.0"}, "versions": {}}"#);

        let release = NpmRegistryClient::release_from(packument).unwrap();
        assert_eq!(release.version, Version::new(0, 1, 0));
        assert!(release.integrity.is_none());
        assert!(release.shasum.is_none());
    }

    #[test]
    fn test_release_missing_latest_tag() {
        let packument = packument(r#"{"versions": {}}"#);

        let error = NpmRegistryClient::release_from(packument).unwrap_err();
        assert!(matches!(error, RegistryError::Malformed { .. }));
    }

    #[test]
    fn test_release_invalid_latest_version() {
        let packument = packument(r#"{"dist-tags": {"latest": "not-semver"}}"#);

        let error = NpmRegistryClient::release_from(packument).unwrap_err();
        assert!(matches!(error, RegistryError::Malformed { .. }));
    }

    #[test]
    fn test_registry_override_trims_slash() {
        let client = NpmRegistryClient::new(".").with_registry("https://npm.example.com/");
        assert_eq!(
            client.registry_override.as_deref(),
            Some("https://npm.example.com")
        );
    }
}
