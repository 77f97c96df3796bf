//! Plugin lifecycle
//!
//! The hosting runtime notifies the plugin on start and stop. Neither hook
//! has side effects beyond diagnostics.

use sp_core::{Error, Plugin};
use tracing::info;

/// Runtime mode reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    #[default]
    Deployment,
}

impl std::str::FromStr for RuntimeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "deployment" | "prod" => Ok(Self::Deployment),
            other => Err(Error::Config(format!(
                "Unknown runtime mode '{other}'. Expected 'development' or 'deployment'"
            ))),
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Deployment => write!(f, "deployment"),
        }
    }
}

/// The s3cmd plugin as seen by its host
#[derive(Debug, Clone, Copy, Default)]
pub struct S3cmdPlugin {
    mode: RuntimeMode,
}

impl S3cmdPlugin {
    pub fn new(mode: RuntimeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }
}

impl Plugin for S3cmdPlugin {
    fn start(&self) {
        if self.mode == RuntimeMode::Development {
            info!("S3CMD PLUGIN DEVELOPMENT MODE");
        }
    }

    fn stop(&self) {
        info!("s3cmd plugin stopped");
    }
}
