//! Configuration loading from `~/.config/quire/config.yaml`.
//!
//! Every setting has a default, so a missing config file is not an error.
//! A few settings can be overridden through environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::QuireError;

/// Raw YAML config structure.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    docs: DocsConfig,

    #[serde(default)]
    tree: TreeConfig,

    #[serde(default)]
    index: IndexConfig,
}

#[derive(Debug, Deserialize)]
struct DocsConfig {
    directory: Option<String>,

    #[serde(default = "default_extensions")]
    extensions: Vec<String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![".md".into()]
}

#[derive(Debug, Deserialize)]
struct TreeConfig {
    #[serde(default = "default_entry_point")]
    entry_point: String,

    #[serde(default = "default_landing_prefix")]
    landing_prefix: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
            landing_prefix: default_landing_prefix(),
        }
    }
}

fn default_entry_point() -> String {
    "getting-started".into()
}

fn default_landing_prefix() -> String {
    "01-".into()
}

#[derive(Debug, Deserialize)]
struct IndexConfig {
    #[serde(default = "default_build_timeout_secs")]
    build_timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            build_timeout_secs: default_build_timeout_secs(),
        }
    }
}

fn default_build_timeout_secs() -> u64 {
    30
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory holding the documentation sources.
    pub docs_dir: PathBuf,
    /// File extensions treated as documentation sources.
    pub extensions: Vec<String>,
    /// Path of the root document that always sorts first.
    pub entry_point: String,
    /// Filename prefix marking a section landing document.
    pub landing_prefix: String,
    pub build_timeout: Duration,
}

impl AppConfig {
    /// Config file path.
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("quire")
            .join("config.yaml")
    }
}

/// Load configuration from the YAML file, then apply env var overrides.
pub fn load_config() -> Result<AppConfig, QuireError> {
    let config_path = AppConfig::config_path();

    let raw: RawConfig = if config_path.exists() {
        let text = std::fs::read_to_string(&config_path).map_err(|e| {
            QuireError::Config(format!("Failed to read {}: {e}", config_path.display()))
        })?;
        parse_config(&text).map_err(|e| {
            QuireError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?
    } else {
        RawConfig::default()
    };

    resolve(raw, |key| env::var(key).ok())
}

fn parse_config(text: &str) -> Result<RawConfig, serde_yaml::Error> {
    // An empty file deserializes to unit, not a mapping
    if text.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    serde_yaml::from_str(text)
}

/// Merge the raw file config with overrides looked up through `env`.
fn resolve(
    raw: RawConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, QuireError> {
    // Docs directory: env > config > ./docs
    let docs_dir = env("QUIRE_DOCS_DIR")
        .or(raw.docs.directory)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("docs"));

    let build_timeout_secs = match env("QUIRE_BUILD_TIMEOUT_SECS") {
        Some(val) => val.trim().parse::<u64>().map_err(|e| {
            QuireError::Config(format!("Invalid QUIRE_BUILD_TIMEOUT_SECS '{val}': {e}"))
        })?,
        None => raw.index.build_timeout_secs,
    };

    if build_timeout_secs == 0 {
        return Err(QuireError::Config(
            "build_timeout_secs must be greater than zero".into(),
        ));
    }

    if raw.tree.landing_prefix.is_empty() {
        return Err(QuireError::Config("landing_prefix must not be empty".into()));
    }

    Ok(AppConfig {
        docs_dir,
        extensions: raw.docs.extensions,
        entry_point: raw.tree.entry_point,
        landing_prefix: raw.tree.landing_prefix.to_lowercase(),
        build_timeout: Duration::from_secs(build_timeout_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_config_file() {
        let config = resolve(RawConfig::default(), no_env).unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("docs"));
        assert_eq!(config.extensions, vec![".md".to_string()]);
        assert_eq!(config.entry_point, "getting-started");
        assert_eq!(config.landing_prefix, "01-");
        assert_eq!(config.build_timeout, Duration::from_secs(30));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let raw = parse_config(
            "docs:\n  directory: /srv/site/content\ntree:\n  entry_point: intro\n",
        )
        .unwrap();
        let config = resolve(raw, no_env).unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("/srv/site/content"));
        assert_eq!(config.extensions, vec![".md".to_string()]);
        assert_eq!(config.entry_point, "intro");
        assert_eq!(config.landing_prefix, "01-");
    }

    #[test]
    fn empty_file_is_default() {
        let raw = parse_config("   \n").unwrap();
        let config = resolve(raw, no_env).unwrap();
        assert_eq!(config.entry_point, "getting-started");
    }

    #[test]
    fn env_overrides_file() {
        let raw = parse_config("docs:\n  directory: from-file\n").unwrap();
        let config = resolve(raw, |key| match key {
            "QUIRE_DOCS_DIR" => Some("from-env".into()),
            "QUIRE_BUILD_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.docs_dir, PathBuf::from("from-env"));
        assert_eq!(config.build_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = resolve(RawConfig::default(), |key| {
            (key == "QUIRE_BUILD_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, QuireError::Config(_)));

        let raw = parse_config("index:\n  build_timeout_secs: 0\n").unwrap();
        assert!(resolve(raw, no_env).is_err());
    }

    #[test]
    fn landing_prefix_is_lowercased() {
        let raw = parse_config("tree:\n  landing_prefix: Intro-\n").unwrap();
        let config = resolve(raw, no_env).unwrap();
        assert_eq!(config.landing_prefix, "intro-");
    }
}
