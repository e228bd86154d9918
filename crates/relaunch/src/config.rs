//! Launcher configuration.
//!
//! Sources, later ones win: built-in defaults, `relaunch.toml` next to the
//! executable (or `--config`), `RELAUNCH_*` environment variables, then
//! command line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use relaunch_fetch::Timeouts;
use relaunch_manifest::Manifest;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const CONFIG_FILE: &str = "relaunch.toml";
const ENV_PREFIX: &str = "RELAUNCH_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Bundled manifest; relative paths are taken from the launcher directory.
    pub manifest:        PathBuf,
    /// Seconds.
    pub connect_timeout: u64,
    /// Seconds.
    pub read_timeout:    u64,
    pub log:             String,
    pub progress:        bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            manifest:        PathBuf::from("app.json"),
            connect_timeout: timeouts.connect.as_secs(),
            read_timeout:    timeouts.read.as_secs(),
            log:             "info".to_string(),
            progress:        true,
        }
    }
}

/// Values given on the command line; unset ones leave lower layers alone.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest:        Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connect_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    read_timeout:    Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log:             Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress:        Option<bool>,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            manifest:        cli.manifest.clone(),
            connect_timeout: cli.connect_timeout,
            read_timeout:    cli.read_timeout,
            log:             cli.log.clone(),
            progress:        cli.quiet.then_some(false),
        }
    }
}

impl LauncherConfig {
    pub fn load(cli: &Cli, launcher_dir: &Path) -> Result<Self, figment::Error> {
        let file = cli
            .config
            .clone()
            .unwrap_or_else(|| launcher_dir.join(CONFIG_FILE));
        Self::figment(&file, Overrides::from(cli)).extract()
    }

    fn figment(file: &Path, overrides: Overrides) -> Figment {
        Figment::from(Serialized::defaults(LauncherConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connect_timeout),
            read:    Duration::from_secs(self.read_timeout),
        }
    }

    /// The bundled manifest, if one is installed and readable.
    pub fn embedded_manifest(&self, launcher_dir: &Path) -> Option<Manifest> {
        let path = launcher_dir.join(&self.manifest);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no bundled manifest");
            return None;
        }
        match Manifest::load_file(&path) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable bundled manifest");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use figment::Jail;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("relaunch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            let config = LauncherConfig::load(&cli(&[]), jail.directory())?;
            assert_eq!(config, LauncherConfig::default());
            assert_eq!(config.timeouts(), Timeouts::default());
            Ok(())
        });
    }

    #[test]
    fn test_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                    manifest = "bundle/app.json"
                    connect_timeout = 5
                    log = "debug"
                "#,
            )?;
            jail.set_env("RELAUNCH_CONNECT_TIMEOUT", "7");
            jail.set_env("RELAUNCH_READ_TIMEOUT", "9");

            let config =
                LauncherConfig::load(&cli(&["--read-timeout", "11", "-q"]), jail.directory())?;

            assert_eq!(config.manifest, PathBuf::from("bundle/app.json"));
            assert_eq!(config.log, "debug");
            assert_eq!(config.connect_timeout, 7);
            assert_eq!(config.read_timeout, 11);
            assert!(!config.progress);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_file() {
        Jail::expect_with(|jail| {
            jail.create_file("other.toml", "progress = false")?;
            let config = LauncherConfig::load(&cli(&["--config", "other.toml"]), Path::new("/nonexistent"))?;
            assert!(!config.progress);
            Ok(())
        });
    }

    #[test]
    fn test_embedded_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = LauncherConfig::default();
        assert!(config.embedded_manifest(dir.path()).is_none());

        std::fs::write(dir.path().join("app.json"), b"not json").unwrap();
        assert!(config.embedded_manifest(dir.path()).is_none());

        let manifest = Manifest::new(
            "demo",
            url::Url::parse("https://example.com/demo/").unwrap(),
            1,
            "bin/demo",
        );
        manifest.persist(dir.path()).unwrap();
        assert_eq!(config.embedded_manifest(dir.path()), Some(manifest));
    }
}
