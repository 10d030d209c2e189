//! Layered configuration for dirman.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. a config file (`.toml`, `.yaml`/`.yml` or `.json`, picked by extension),
//!    by default `dirman.toml` in the platform config directory if present,
//! 3. `DIRMAN_`-prefixed environment variables, with `__` between nested keys
//!    (`DIRMAN_FILTER__TARGET_EXTENSIONS="[rs, toml]"`).
//!
//! ```toml
//! root = "/srv/notes"
//! encoding = "utf-8"
//!
//! [filter]
//! ignore_path_components = [".git", "target"]
//! ignore_filename_substrings = ["~"]
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use dirman_manager::{DirectoryManager, Encoding, Options, WalkFilter};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "DIRMAN_";
pub const DEFAULT_FILE_NAME: &str = "dirman.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the managed tree. Absent means the current working directory.
    pub root: Option<PathBuf>,
    /// Text encoding label, see [`Encoding`].
    pub encoding: String,
    pub filter: FilterConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            encoding: Encoding::default().to_string(),
            filter: FilterConfig::default(),
        }
    }
}

/// The walk filter lists, as written in a config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub ignore_path_components: Vec<String>,
    pub target_extensions: Vec<String>,
    pub target_exact_filenames: Vec<String>,
    pub whitelist_filename_substrings: Vec<String>,
    pub ignore_filename_substrings: Vec<String>,
}
impl From<&FilterConfig> for WalkFilter {
    fn from(config: &FilterConfig) -> Self {
        WalkFilter::new()
            .ignore_path_components(&config.ignore_path_components)
            .target_extensions(&config.target_extensions)
            .target_exact_filenames(&config.target_exact_filenames)
            .whitelist_filename_substrings(&config.whitelist_filename_substrings)
            .ignore_filename_substrings(&config.ignore_filename_substrings)
    }
}

impl Config {
    /// `dirman.toml` in the platform config directory, if there is one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dirman")
            .map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
            .filter(|path| path.is_file())
    }

    /// The merged providers, without extracting anything yet.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            let extension = file.extension().map(|e| e.to_string_lossy().to_ascii_lowercase());
            figment = match extension.as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from `file`, or from [`default_path`](Self::default_path) when
    /// `None`. An explicitly given file must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(file) if !file.is_file() => exn::bail!(ErrorKind::NotFound(file.to_path_buf())),
            Some(file) => Some(file.to_path_buf()),
            None => Self::default_path(),
        };
        tracing::debug!(file = ?file, "Loading configuration");
        Self::figment(file.as_deref()).extract::<Self>().or_raise(|| ErrorKind::Load)
    }

    /// Validated manager options.
    pub fn options(&self) -> Result<Options> {
        let encoding = self
            .encoding
            .parse::<Encoding>()
            .or_raise(|| ErrorKind::Invalid(format!("encoding {:?}", self.encoding)))?;
        Ok(Options { encoding, filter: WalkFilter::from(&self.filter) })
    }

    /// Open (and gather) a manager over the configured root.
    pub fn open(&self) -> Result<DirectoryManager> {
        let options = self.options()?;
        let root = self.root.clone().unwrap_or_default();
        DirectoryManager::with_options(&root, options).or_raise(|| ErrorKind::Open)
    }
}
