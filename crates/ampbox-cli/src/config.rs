//! CLI configuration management.
//!
//! Persists the service URL, API key, and default bundle to
//! `~/.ampbox/config.json`. Command-line flags and environment variables
//! take precedence over anything stored here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ampbox_client::types::DEFAULT_BUNDLE;
use ampbox_client::{ClientConfig, ClientError};

/// Persistent CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Ampbox service URL (e.g., "<https://ampbox.example.com>").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// API key used when `AMPBOX_KEY` is not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Bundle used by `run` when `--bundle` is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_bundle: Option<String>,
}

impl CliConfig {
    /// Path to the config directory: `~/.ampbox/`.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ampbox"))
    }

    /// Path to the config file: `~/.ampbox/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from disk. Returns default if file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::config_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        // The file may hold the API key.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Clear the stored API key.
    pub fn clear_key(&mut self) {
        self.api_key = None;
    }

    /// Resolve client settings. `url` and `key` come from flags or the
    /// environment and win over the stored values.
    pub fn client_config(
        &self,
        url: Option<String>,
        key: Option<String>,
    ) -> Result<ClientConfig, ClientError> {
        ClientConfig::resolve(
            url.or_else(|| self.url.clone()),
            key.or_else(|| self.api_key.clone()),
        )
    }

    /// Resolve the bundle for a new session.
    pub fn bundle(&self, requested: Option<String>) -> String {
        requested
            .or_else(|| self.default_bundle.clone())
            .unwrap_or_else(|| DEFAULT_BUNDLE.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_empty() {
        let cfg = CliConfig::default();
        assert!(cfg.url.is_none());
        assert!(cfg.api_key.is_none());
        assert!(cfg.default_bundle.is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = CliConfig {
            url: Some("https://box.test".into()),
            api_key: Some("secret".into()),
            default_bundle: None,
        };
        cfg.save_to(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(
            !json.contains("default_bundle"),
            "None fields should be omitted, got: {json}"
        );
        assert_eq!(CliConfig::load_from(&path), cfg);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = CliConfig {
            api_key: Some("secret".into()),
            ..Default::default()
        };
        cfg.save_to(&path).unwrap();

        let perms = std::fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CliConfig::load_from(&dir.path().join("absent.json"));
        assert_eq!(cfg, CliConfig::default());
    }

    #[test]
    fn invalid_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(CliConfig::load_from(&path), CliConfig::default());
    }

    #[test]
    fn flags_override_stored_values() {
        let cfg = CliConfig {
            url: Some("https://stored.test".into()),
            api_key: Some("stored-key".into()),
            default_bundle: None,
        };
        let client = cfg
            .client_config(Some("https://flag.test".into()), None)
            .unwrap();
        assert_eq!(client.base_url, "https://flag.test");
        assert_eq!(client.api_key, "stored-key");

        let client = cfg.client_config(None, Some("flag-key".into())).unwrap();
        assert_eq!(client.base_url, "https://stored.test");
        assert_eq!(client.api_key, "flag-key");
    }

    #[test]
    fn missing_key_everywhere_fails() {
        let err = CliConfig::default().client_config(None, None).unwrap_err();
        assert!(err.to_string().starts_with("Ampbox API key required."));
    }

    #[test]
    fn bundle_precedence() {
        let mut cfg = CliConfig::default();
        assert_eq!(cfg.bundle(None), "foundation:default");
        cfg.default_bundle = Some("team:review".into());
        assert_eq!(cfg.bundle(None), "team:review");
        assert_eq!(cfg.bundle(Some("x:y".into())), "x:y");
    }

    #[test]
    fn clear_key_removes_only_key() {
        let mut cfg = CliConfig {
            url: Some("u".into()),
            api_key: Some("k".into()),
            default_bundle: None,
        };
        cfg.clear_key();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.url.as_deref(), Some("u"));
    }

    #[test]
    fn config_path_contains_ampbox() {
        if let Some(path) = CliConfig::config_path() {
            assert!(path.to_string_lossy().contains(".ampbox"));
            assert!(path.to_string_lossy().contains("config.json"));
        }
    }
}
