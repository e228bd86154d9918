use std::collections::BTreeMap;
use std::path::Path;

use relaunch_manifest::{MANIFEST_FILE, ManifestError, base_url, parse_location};
use url::Url;

use crate::{LaunchError, Result};

/// Arguments the launcher was started with.
///
/// `--key=value` arguments are also available by name. Every argument,
/// named or not, is kept in order for forwarding to the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    named: BTreeMap<String, String>,
    raw: Vec<String>,
}

impl LaunchParams {
    /// Manifest location overriding the bundled one.
    pub const APP: &'static str = "app";
    /// Deployment base the run is pinned to.
    pub const URI: &'static str = "uri";
    pub const CACHE_DIR: &'static str = "cache-dir";

    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut params = Self::default();
        for arg in args {
            let arg = arg.into();
            if let Some((key, value)) = arg.strip_prefix("--").and_then(|kv| kv.split_once('=')) {
                if !key.is_empty() {
                    params.named.insert(key.to_string(), value.to_string());
                }
            }
            params.raw.push(arg);
        }
        params
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());
        self.raw.push(format!("--{key}={value}"));
        self.named.insert(key, value);
        self
    }

    pub fn named(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// The `app`/`uri` pair, resolved against `base_dir` for plain paths.
    pub fn source_override(&self, base_dir: &Path) -> Result<Option<SourceOverride>> {
        let parse = |key: &str| -> Result<Option<Url>> {
            self.named(key)
                .map(|raw| {
                    parse_location(raw, base_dir).map_err(|source| LaunchError::InvalidParameter {
                        key: key.to_string(),
                        source,
                    })
                })
                .transpose()
        };

        let app = parse(Self::APP)?;
        let uri = parse(Self::URI)?.map(base_url);
        Ok(match (app, uri) {
            (None, None) => None,
            (app, uri) => Some(SourceOverride { app, uri }),
        })
    }
}

/// Manifest source named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOverride {
    pub app: Option<Url>,
    /// Already normalized to end with `/`.
    pub uri: Option<Url>,
}

impl SourceOverride {
    /// Where to read the manifest: `app` if given, else `<uri>/app.json`.
    pub fn location(&self) -> std::result::Result<Url, ManifestError> {
        match (&self.app, &self.uri) {
            (Some(app), _) => Ok(app.clone()),
            (None, Some(uri)) => uri
                .join(MANIFEST_FILE)
                .map_err(|_| ManifestError::InvalidUri(uri.to_string())),
            (None, None) => Err(ManifestError::InvalidUri(String::new())),
        }
    }

    /// A `uri` override pins the run to that deployment.
    pub fn is_pinned(&self) -> bool {
        self.uri.is_some()
    }
}
