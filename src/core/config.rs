//! Project configuration for auto-publish
//!
//! An optional `.autopublish.yml` at the project root supplies defaults that
//! CLI flags override. A missing file yields the default configuration; an
//! unparseable one is an error.

use crate::core::error::PublishError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".autopublish.yml";

/// Root configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AutoPublishConfig {
    /// Registry base URL override (highest-priority endpoint source)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Default version-bump kind when none is passed on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump: Option<String>,
}

impl AutoPublishConfig {
    /// Load `<cwd>/.autopublish.yml`, defaulting when the file is absent
    pub async fn load(cwd: &Path) -> Result<Self, PublishError> {
        let path = cwd.join(CONFIG_FILENAME);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PublishError::Config {
                    path,
                    message: e.to_string(),
                });
            }
        };

        serde_yaml::from_str(&content).map_err(|e| PublishError::Config {
            path,
            message: e.to_string(),
        })
    }
}
