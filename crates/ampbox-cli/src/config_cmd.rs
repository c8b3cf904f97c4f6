//! Config subcommands: show, set, clear-key.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;
use std::path::Path;

use ampbox_client::config::DEFAULT_URL;
use ampbox_client::types::DEFAULT_BUNDLE;

use crate::config::CliConfig;

/// Config subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the stored configuration.
    Show,
    /// Store settings used when no flag or environment variable is given.
    Set {
        /// Ampbox service URL.
        #[arg(long)]
        url: Option<String>,
        /// API key.
        #[arg(long)]
        key: Option<String>,
        /// Default bundle for `run`.
        #[arg(long)]
        bundle: Option<String>,
    },
    /// Remove the stored API key.
    ClearKey,
}

/// Execute a config subcommand against the config file at `path`.
pub fn run(
    action: ConfigAction,
    config: &mut CliConfig,
    path: &Path,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show(config, path, out)?,
        ConfigAction::Set { url, key, bundle } => {
            if url.is_none() && key.is_none() && bundle.is_none() {
                anyhow::bail!("Nothing to set. Use --url, --key or --bundle");
            }
            if url.is_some() {
                config.url = url;
            }
            if key.is_some() {
                config.api_key = key;
            }
            if bundle.is_some() {
                config.default_bundle = bundle;
            }
            config.save_to(path)?;
            writeln!(out, "Configuration saved to {}", path.display())?;
        }
        ConfigAction::ClearKey => {
            config.clear_key();
            config.save_to(path)?;
            writeln!(out, "API key removed")?;
        }
    }
    Ok(())
}

fn show(config: &CliConfig, path: &Path, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Config file: {}", path.display())?;
    match &config.url {
        Some(url) => writeln!(out, "URL:     {url}")?,
        None => writeln!(out, "URL:     {DEFAULT_URL} (default)")?,
    }
    match &config.api_key {
        Some(key) => writeln!(out, "API key: {}", mask_key(key))?,
        None => writeln!(out, "API key: (not set)")?,
    }
    match &config.default_bundle {
        Some(bundle) => writeln!(out, "Bundle:  {bundle}")?,
        None => writeln!(out, "Bundle:  {DEFAULT_BUNDLE} (default)")?,
    }
    Ok(())
}

/// Hide all but the last four characters of a key.
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("****{tail}")
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        action: ConfigAction,
    }

    #[test]
    fn parse_set() {
        let cli = TestCli::parse_from(["test", "set", "--key", "k", "--bundle", "b:c"]);
        match cli.action {
            ConfigAction::Set { url, key, bundle } => {
                assert!(url.is_none());
                assert_eq!(key.as_deref(), Some("k"));
                assert_eq!(bundle.as_deref(), Some("b:c"));
            }
            other => panic!("Expected Set, got {other:?}"),
        }
    }

    #[test]
    fn parse_clear_key() {
        let cli = TestCli::parse_from(["test", "clear-key"]);
        assert!(matches!(cli.action, ConfigAction::ClearKey));
    }

    #[test]
    fn set_merges_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = CliConfig {
            url: Some("https://old.test".into()),
            ..Default::default()
        };
        let mut out = Vec::new();

        run(
            ConfigAction::Set {
                url: None,
                key: Some("abcdefghijkl".into()),
                bundle: None,
            },
            &mut cfg,
            &path,
            &mut out,
        )
        .unwrap();

        let loaded = CliConfig::load_from(&path);
        assert_eq!(loaded.url.as_deref(), Some("https://old.test"));
        assert_eq!(loaded.api_key.as_deref(), Some("abcdefghijkl"));
        assert!(String::from_utf8(out).unwrap().starts_with("Configuration saved to"));
    }

    #[test]
    fn set_without_values_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let err = run(
            ConfigAction::Set {
                url: None,
                key: None,
                bundle: None,
            },
            &mut CliConfig::default(),
            &path,
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Nothing to set"));
        assert!(!path.exists());
    }

    #[test]
    fn clear_key_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = CliConfig {
            api_key: Some("secret".into()),
            ..Default::default()
        };
        run(ConfigAction::ClearKey, &mut cfg, &path, &mut Vec::new()).unwrap();
        assert!(CliConfig::load_from(&path).api_key.is_none());
    }

    #[test]
    fn show_masks_key_and_marks_defaults() {
        let cfg = CliConfig {
            api_key: Some("ak-1234567890".into()),
            ..Default::default()
        };
        let mut out = Vec::new();
        run(
            ConfigAction::Show,
            &mut cfg.clone(),
            Path::new("/home/u/.ampbox/config.json"),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("URL:     http://localhost:8080 (default)"));
        assert!(text.contains("API key: ****7890"));
        assert!(!text.contains("ak-123"));
        assert!(text.contains("Bundle:  foundation:default (default)"));
    }

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(mask_key("abc"), "****");
        assert_eq!(mask_key("12345678"), "****");
        assert_eq!(mask_key("123456789"), "****6789");
    }
}
