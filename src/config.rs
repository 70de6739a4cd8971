use crate::client::{DEFAULT_TIMEOUT_SECS, SLACK_API_BASE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Credential and destination of a [`Notifier`](crate::Notifier).
///
/// ```toml
/// token = "xoxb-..."
/// channel = "C1234567890"
/// # api_base = "https://slack.com/api"
/// # timeout_secs = 30
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Bot user OAuth token (xoxb-...)
    #[serde(default)]
    pub token: String,
    /// Channel ID all messages are posted to
    #[serde(default)]
    pub channel: String,
    /// Override for the Slack API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel: String::new(),
            api_base: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl NotifierConfig {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channel: channel.into(),
            ..Default::default()
        }
    }

    /// Default location: `~/.config/busypenguin/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("busypenguin")
            .join("config.toml")
    }

    /// Load configuration from file.
    ///
    /// An explicit `path` must exist; a missing default file yields an empty
    /// configuration to be filled from the environment.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(&p),
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::from_file(&p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Configuration from the environment only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `BUSYPENGUIN_TOKEN` (or `SLACK_TOKEN`), `BUSYPENGUIN_CHANNEL`
    /// and `BUSYPENGUIN_API_BASE` when set.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, get: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| get(key).filter(|v| !v.is_empty());

        if let Some(token) = non_empty("BUSYPENGUIN_TOKEN").or_else(|| non_empty("SLACK_TOKEN")) {
            self.token = token;
        }
        if let Some(channel) = non_empty("BUSYPENGUIN_CHANNEL") {
            self.channel = channel;
        }
        if let Some(base) = non_empty("BUSYPENGUIN_API_BASE") {
            self.api_base = Some(base);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Config("missing API token".to_string()));
        }
        if self.channel.trim().is_empty() {
            return Err(Error::Config("missing channel".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(SLACK_API_BASE)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("token", &"<redacted>")
            .field("channel", &self.channel)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "token = \"xoxb-1\"\nchannel = \"C42\"\n").unwrap();

        let config = NotifierConfig::load(Some(path)).unwrap();
        assert_eq!(config.token, "xoxb-1");
        assert_eq!(config.channel, "C42");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.api_base(), SLACK_API_BASE);
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NotifierConfig::load(Some(dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "token = [").unwrap();
        assert!(matches!(NotifierConfig::from_file(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = NotifierConfig::new("xoxb-2", "C7");
        config.api_base = Some("http://localhost:8080/api".into());
        config.save(&path).unwrap();

        let loaded = NotifierConfig::from_file(&path).unwrap();
        assert_eq!(loaded.channel, "C7");
        assert_eq!(loaded.api_base(), "http://localhost:8080/api");
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("SLACK_TOKEN", "xoxb-fallback"),
            ("BUSYPENGUIN_CHANNEL", "C99"),
            ("BUSYPENGUIN_API_BASE", ""),
        ]
        .into_iter()
        .collect();

        let mut config = NotifierConfig::new("", "C1");
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.token, "xoxb-fallback");
        assert_eq!(config.channel, "C99");
        assert_eq!(config.api_base, None);

        let mut config = NotifierConfig::default();
        config.apply_vars(|k| match k {
            "BUSYPENGUIN_TOKEN" => Some("xoxb-primary".into()),
            "SLACK_TOKEN" => Some("xoxb-fallback".into()),
            _ => None,
        });
        assert_eq!(config.token, "xoxb-primary");
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            NotifierConfig::new("", "C1").validate(),
            Err(Error::Config(_))
        ));
        assert!(NotifierConfig::new("xoxb", " ").validate().is_err());
        let mut config = NotifierConfig::new("xoxb", "C1");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let dbg = format!("{:?}", NotifierConfig::new("xoxb-secret", "C1"));
        assert!(!dbg.contains("xoxb-secret"));
        assert!(dbg.contains("C1"));
    }
}
