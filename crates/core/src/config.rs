//! Configuration management
//!
//! The host supplies a string mapping of plugin settings. This module resolves
//! that mapping against defaults computed once at startup, and loads the
//! mapping from the TOML settings file used by the command-line host
//! (~/.config/s3prov/config.toml by default).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::classify::{DEFAULT_RECOVERABLE_EXIT_CODES, ExitPolicy};
use crate::error::{Error, Result};

/// Key naming the s3cmd executable
pub const CLIENT_KEY: &str = "client";

/// Key naming the s3cmd configuration file
pub const CONFIG_FILE_KEY: &str = "config-file-location";

/// Key selecting how much client output is echoed
pub const VERBOSITY_KEY: &str = "verbosity";

/// Key listing the exit codes treated as recoverable, comma separated
pub const RECOVERABLE_EXIT_CODES_KEY: &str = "recoverable-exit-codes";

/// Default s3cmd executable
pub const DEFAULT_CLIENT: &str = "/usr/bin/s3cmd";

/// Name of the s3cmd configuration file in the home directory
pub const DEFAULT_CONFIG_FILE_NAME: &str = ".s3cfg";

/// Current settings file schema version
pub const SCHEMA_VERSION: u32 = 1;

/// How much of the client's output is echoed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Client output is only logged
    Minimal,
    /// Transfer progress is echoed to the console
    #[default]
    Normal,
}

impl std::str::FromStr for Verbosity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "normal" => Ok(Self::Normal),
            other => Err(Error::Config(format!(
                "Unknown verbosity '{other}'. Expected 'minimal' or 'normal'"
            ))),
        }
    }
}

/// Fallback locations used when the mapping omits a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub client: PathBuf,
    /// `None` when the home directory could not be determined
    pub config_file: Option<PathBuf>,
}

impl Defaults {
    /// Create defaults with explicit paths (useful for testing)
    pub fn new(client: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            client: client.into(),
            config_file: Some(config_file.into()),
        }
    }

    /// Compute defaults from the process environment
    ///
    /// A missing home directory is only an error once a configuration
    /// actually needs the default config file.
    pub fn from_env() -> Self {
        Self {
            client: PathBuf::from(DEFAULT_CLIENT),
            config_file: dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE_NAME)),
        }
    }
}

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Path to the s3cmd executable
    pub client: PathBuf,

    /// Path to the s3cmd configuration file
    pub config_file: PathBuf,

    pub verbosity: Verbosity,

    /// Exit codes reported as an ordinary negative result
    pub exit_policy: ExitPolicy,
}

impl ClientConfig {
    /// Resolve the host's settings mapping against the defaults
    ///
    /// A missing mapping is an error rather than a silent fallback.
    pub fn resolve(settings: Option<&HashMap<String, String>>, defaults: &Defaults) -> Result<Self> {
        let settings = settings.ok_or(Error::ConfigurationMissing)?;

        let client = settings
            .get(CLIENT_KEY)
            .map(PathBuf::from)
            .unwrap_or_else(|| defaults.client.clone());
        let config_file = match settings.get(CONFIG_FILE_KEY) {
            Some(path) => PathBuf::from(path),
            None => defaults.config_file.clone().ok_or_else(|| {
                Error::Config(format!(
                    "Could not determine home directory; set {CONFIG_FILE_KEY}"
                ))
            })?,
        };
        let verbosity = match settings.get(VERBOSITY_KEY) {
            Some(value) => value.parse()?,
            None => Verbosity::default(),
        };
        let exit_policy = match settings.get(RECOVERABLE_EXIT_CODES_KEY) {
            Some(value) => ExitPolicy::new(parse_exit_codes(value)?),
            None => ExitPolicy::new(DEFAULT_RECOVERABLE_EXIT_CODES),
        };

        Ok(Self {
            client,
            config_file,
            verbosity,
            exit_policy,
        })
    }

    /// Whether transfer output should be echoed
    pub fn echo_transfers(&self) -> bool {
        self.verbosity == Verbosity::Normal
    }
}

fn parse_exit_codes(value: &str) -> Result<Vec<i32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<i32>().map_err(|_| {
                Error::Config(format!(
                    "Invalid exit code '{code}' in {RECOVERABLE_EXIT_CODES_KEY}"
                ))
            })
        })
        .collect()
}

/// On-disk settings file
#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    #[serde(default = "default_schema_version")]
    schema_version: u32,

    /// Plugin settings, keyed like the host mapping
    #[serde(default)]
    s3cmd: Option<HashMap<String, String>>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Settings manager handles locating and loading the settings file
#[derive(Debug)]
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a SettingsManager with the default settings path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let settings_path = config_dir.join("s3prov").join("config.toml");
        Ok(Self { settings_path })
    }

    /// Create a SettingsManager with a custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: path.into(),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load the plugin settings mapping
    ///
    /// Returns `None` when the file does not exist or has no `[s3cmd]` table.
    pub fn load(&self) -> Result<Option<HashMap<String, String>>> {
        if !self.settings_path.exists() {
            debug!("No settings file at {}", self.settings_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.settings_path)?;
        let file: SettingsFile = toml::from_str(&content)?;

        if file.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Settings file version {} is newer than supported version {}",
                file.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(file.s3cmd)
    }
}
