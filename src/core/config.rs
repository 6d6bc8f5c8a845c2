use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_PRIMARY_FEED_URL: &str = "https://api.frankfurter.app";
pub const DEFAULT_FALLBACK_FEED_URL: &str = "https://open.er-api.com";
pub const DEFAULT_FALLBACK_ANCHOR: &str = "USD";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrimaryFeedConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FallbackFeedConfig {
    pub base_url: String,
    #[serde(default)]
    pub anchor: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub primary: Option<PrimaryFeedConfig>,
    pub fallback: Option<FallbackFeedConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            primary: Some(PrimaryFeedConfig {
                base_url: DEFAULT_PRIMARY_FEED_URL.to_string(),
            }),
            fallback: Some(FallbackFeedConfig {
                base_url: DEFAULT_FALLBACK_FEED_URL.to_string(),
                anchor: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Identifier of the local user that owns the records.
    pub owner: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "outlay")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "outlay")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn primary_feed_url(&self) -> &str {
        self.providers
            .primary
            .as_ref()
            .map_or(DEFAULT_PRIMARY_FEED_URL, |p| &p.base_url)
    }

    pub fn fallback_feed_url(&self) -> &str {
        self.providers
            .fallback
            .as_ref()
            .map_or(DEFAULT_FALLBACK_FEED_URL, |p| &p.base_url)
    }

    pub fn fallback_anchor(&self) -> &str {
        self.providers
            .fallback
            .as_ref()
            .and_then(|p| p.anchor.as_deref())
            .unwrap_or(DEFAULT_FALLBACK_ANCHOR)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        if config.owner.trim().is_empty() {
            anyhow::bail!(
                "Config file {} must set a non-empty owner",
                path.as_ref().display()
            );
        }
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
owner: "alice"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.owner, "alice");
        assert!(config.data_path.is_none());
        assert_eq!(config.primary_feed_url(), DEFAULT_PRIMARY_FEED_URL);
        assert_eq!(config.fallback_feed_url(), DEFAULT_FALLBACK_FEED_URL);
        assert_eq!(config.fallback_anchor(), "USD");

        let yaml_str_with_providers = r#"
owner: "bob"
data_path: "/tmp/outlay"
providers:
  primary:
    base_url: "http://example.com/primary"
  fallback:
    base_url: "http://example.com/fallback"
    anchor: "GBP"
        "#;
        let config: AppConfig = serde_yaml::from_str(yaml_str_with_providers).unwrap();
        assert_eq!(config.primary_feed_url(), "http://example.com/primary");
        assert_eq!(config.fallback_feed_url(), "http://example.com/fallback");
        assert_eq!(config.fallback_anchor(), "GBP");
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/outlay")
        );
    }

    #[test]
    fn test_load_rejects_blank_owner() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "owner: \"  \"\n").unwrap();
        assert!(AppConfig::load_from_path(file.path()).is_err());
    }
}
