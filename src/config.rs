use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

use crate::github::DEFAULT_PER_PAGE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub review: ReviewConfig,
    pub api: ApiConfig,
}

/// Used when `--repo` / `--pr` are not given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub repo: Option<String>,
    pub pr: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Event used by `submit-review` when `--event` is omitted
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub per_page: u32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            event: "COMMENT".to_owned(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> PathBuf {
        BaseDirectories::with_prefix("gh-comment")
            .map(|dirs| dirs.get_config_home().join("config.toml"))
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_config_path_follows_xdg_config_home() {
        let orig = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", "/tmp/gh-comment-xdg-test");

        assert_eq!(
            Config::config_path(),
            PathBuf::from("/tmp/gh-comment-xdg-test/gh-comment/config.toml")
        );

        match orig {
            Some(v) => env::set_var("XDG_CONFIG_HOME", v),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/gh-comment/config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.review.event, "COMMENT");
        assert_eq!(config.api.per_page, 100);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[defaults]
repo = "octocat/hello-world"

[review]
event = "APPROVE"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults.repo.as_deref(), Some("octocat/hello-world"));
        assert_eq!(config.defaults.pr, None);
        assert_eq!(config.review.event, "APPROVE");
        assert_eq!(config.api.per_page, 100);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "defaults = 3").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse config file");
    }
}
