use std::path::{Path, PathBuf};

use ipxact_model::{ModelError, SchemaVersion};
use regsheet::SheetNames;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "irgen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {config_path} does not exist")]
    NotFound { config_path: PathBuf },

    #[error("failed to read config file at {config_path}: {source}")]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {config_path}: {source}")]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for '{key}' in {config_path}: {reason}")]
    Invalid {
        config_path: PathBuf,
        key: &'static str,
        reason: String,
    },
}

/// Settings read from `irgen.toml`. Every key is optional; command-line
/// flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub vendor_sheet: Option<String>,
    pub address_sheet: Option<String>,
    pub ipxact_version: Option<String>,
    pub block_width: Option<u32>,
    pub xsd_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Load `config_path`, returning `Ok(None)` when the file does not exist.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            config_path: config_path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        if config.block_width == Some(0) {
            return Err(ConfigError::Invalid {
                config_path: config_path.to_path_buf(),
                key: "block_width",
                reason: "must be positive".into(),
            });
        }
        if let Some(version) = config.ipxact_version.as_deref() {
            version
                .parse::<SchemaVersion>()
                .map_err(|err| ConfigError::Invalid {
                    config_path: config_path.to_path_buf(),
                    key: "ipxact_version",
                    reason: err.to_string(),
                })?;
        }
        Ok(Some(config))
    }

    /// Load the explicitly requested file, or `irgen.toml` when present.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path)?.ok_or_else(|| ConfigError::NotFound {
                config_path: path.to_path_buf(),
            }),
            None => Ok(Self::load_from_path(DEFAULT_CONFIG_FILE)?.unwrap_or_default()),
        }
    }

    /// Sheet names and block width, with flags overriding the file.
    pub fn sheet_names(&self, vendor: Option<String>, address: Option<String>) -> SheetNames {
        let defaults = SheetNames::default();
        SheetNames {
            vendor: vendor
                .or_else(|| self.vendor_sheet.clone())
                .unwrap_or(defaults.vendor),
            address: address
                .or_else(|| self.address_sheet.clone())
                .unwrap_or(defaults.address),
            block_width: self.block_width.unwrap_or(defaults.block_width),
        }
    }

    /// Selected schema revision; only renderable revisions are accepted.
    pub fn schema_version(&self, flag: Option<&str>) -> Result<SchemaVersion, ModelError> {
        match flag.or(self.ipxact_version.as_deref()) {
            Some(text) => text.parse::<SchemaVersion>()?.ensure_supported(),
            None => Ok(SchemaVersion::default()),
        }
    }

    pub fn xsd_dir(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.xsd_dir.clone())
    }
}
