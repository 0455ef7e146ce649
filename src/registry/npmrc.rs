//! Registry endpoint resolution from `.npmrc`
//!
//! Scoped packages may be configured to resolve against a different registry
//! than the default, via lines like `@org:registry=https://npm.example.com`.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Default public registry endpoint
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Registry entries parsed from a project's `.npmrc`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpmrcConfig {
    default_registry: Option<String>,
    scoped: HashMap<String, String>,
}

impl NpmrcConfig {
    /// Load `<cwd>/.npmrc`; a missing or unreadable file yields no entries
    pub async fn load(cwd: &Path) -> Self {
        match fs::read_to_string(cwd.join(".npmrc")).await {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse registry lines, ignoring comments and unrelated keys
    pub fn parse(content: &str) -> Self {
        let line_re = Regex::new(r"^\s*(?:(@[^:=\s]+):)?registry\s*=\s*(\S+)\s*$")
            .expect("registry line pattern is valid");

        let mut config = Self::default();
        for line in content.lines() {
            if line.trim_start().starts_with(';') || line.trim_start().starts_with('#') {
                continue;
            }
            if let Some(captures) = line_re.captures(line) {
                let url = captures[2].trim_end_matches('/').to_string();
                match captures.get(1) {
                    Some(scope) => {
                        config.scoped.insert(scope.as_str().to_string(), url);
                    }
                    None => config.default_registry = Some(url),
                }
            }
        }
        config
    }

    /// Resolve the registry endpoint for a package name
    ///
    /// A scoped name checks its scope entry first, then the default entry,
    /// then the public registry.
    pub fn registry_for(&self, package_name: &str) -> String {
        if let Some(scope) = package_scope(package_name) {
            if let Some(url) = self.scoped.get(scope) {
                return url.clone();
            }
        }
        self.default_registry
            .clone()
            .unwrap_or_else(|| DEFAULT_REGISTRY.to_string())
    }
}

/// Extract the `@scope` prefix of a scoped package name
fn package_scope(package_name: &str) -> Option<&str> {
    if !package_name.starts_with('@') {
        return None;
    }
    package_name.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_registry_fallback() {
        let config = NpmrcConfig::default();
        assert_eq!(config.registry_for("left-pad"), DEFAULT_REGISTRY);
        assert_eq!(config.registry_for("@org/left-pad"), DEFAULT_REGISTRY);
    }

    #[test]
    fn test_parse_default_entry() {
        let config = NpmrcConfig::parse("registry=https://npm.internal.example/\n");
        assert_eq!(
            config.registry_for("left-pad"),
            "https://npm.internal.example"
        );
    }

    #[test]
    fn test_parse_scoped_entry() {
        let content = "\
; comment line
registry=https://npm.internal.example
@org:registry=https://npm.org.example
email=dev@example.com
";
        let config = NpmrcConfig::parse(content);

        assert_eq!(config.registry_for("@org/tool"), "https://npm.org.example");
        assert_eq!(
            config.registry_for("@other/tool"),
            "https://npm.internal.example"
        );
        assert_eq!(config.registry_for("tool"), "https://npm.internal.example");
    }

    #[test]
    fn test_unrelated_keys_ignored() {
        let config = NpmrcConfig::parse("save-exact=true\nfund=false\n");
        assert_eq!(config, NpmrcConfig::default());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = NpmrcConfig::load(temp_dir.path()).await;
        assert_eq!(config, NpmrcConfig::default());
    }

    #[tokio::test]
    async fn test_load_project_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".npmrc"),
            "@acme:registry=https://npm.acme.example\n",
        )
        .await
        .unwrap();

        let config = NpmrcConfig::load(temp_dir.path()).await;
        assert_eq!(
            config.registry_for("@acme/widget"),
            "https://npm.acme.example"
        );
    }

    #[test]
    fn test_package_scope() {
        assert_eq!(package_scope("@org/pkg"), Some("@org"));
        assert_eq!(package_scope("pkg"), None);
    }
}
