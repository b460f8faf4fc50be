//! Configuration for the release tooling
//!
//! Layers, lowest priority first:
//! - Built-in defaults
//! - `appstream.toml` in the user config directory
//! - `appstream.toml`, `.appstream.toml` or `config/appstream.toml` in the
//!   working directory
//! - A file named with `--config`
//! - Environment variables (`APPSTREAM__*`)
//!
//! ## Example config file (appstream.toml):
//! ```toml
//! [output]
//! api_version = 0.8
//! max_releases = 5
//! format = "compact"
//!
//! [parse]
//! source_kind = "appdata"
//! locale = "de"
//! ```

use config_crate::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::{NodeContext, SourceKind, API_VERSION_NEWEST, DEFAULT_MAX_RELEASES};
use crate::error::Result;
use crate::localized::DEFAULT_LOCALE;

const CONFIG_FILE: &str = "appstream.toml";

/// Settings for `release-tool`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Parse settings
    #[serde(default)]
    pub parse: ParseConfig,
}

/// How releases are written back out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// AppStream API version to target
    #[serde(default = "default_api_version")]
    pub api_version: f64,

    /// Releases written per `<releases>` block
    #[serde(default = "default_max_releases")]
    pub max_releases: usize,

    /// JSON layout for exports
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

/// How input documents are read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Force a source kind instead of guessing it from the file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<SourceKind>,

    /// Locale used when printing descriptions
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_api_version() -> f64 {
    API_VERSION_NEWEST
}

fn default_max_releases() -> usize {
    DEFAULT_MAX_RELEASES
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            max_releases: default_max_releases(),
            format: OutputFormat::Pretty,
        }
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            source_kind: None,
            locale: default_locale(),
        }
    }
}

impl ToolConfig {
    /// Config files consulted in order, later files overriding earlier ones:
    /// the per-user file first, then the working directory.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dirs) = ProjectDirs::from("org", "appstream", "release-tool") {
            paths.push(dirs.config_dir().join(CONFIG_FILE));
        }
        paths.push(PathBuf::from(CONFIG_FILE));
        paths.push(PathBuf::from(format!(".{}", CONFIG_FILE)));
        paths.push(Path::new("config").join(CONFIG_FILE));
        paths
    }

    /// Load the layered configuration.
    ///
    /// `explicit` is applied after the search paths and must exist.
    /// `APPSTREAM__SECTION__KEY` environment variables override everything,
    /// e.g. `APPSTREAM__OUTPUT__API_VERSION=0.8`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        for path in Self::search_paths() {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            tracing::debug!("loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("APPSTREAM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Context for reading and writing the document at `path`
    pub fn context_for(&self, path: &Path) -> NodeContext {
        let source_kind = self.parse.source_kind.unwrap_or_else(|| {
            SourceKind::guess(&path.file_name().unwrap_or_default().to_string_lossy())
        });
        NodeContext::new(self.output.api_version, source_kind)
            .with_max_releases(self.output.max_releases)
    }
}
