//! Error types for sp-core
//!
//! Provides a closed set of failure kinds so hosts can decide policy per kind,
//! and a mapping of each kind to a CLI exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for provisioning operations
#[derive(Error, Debug)]
pub enum Error {
    /// No configuration mapping was supplied by the host
    #[error("Configuration missing: no plugin settings were supplied")]
    ConfigurationMissing,

    /// Configuration present but invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reference does not use a handled scheme or names no bucket
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Size of the upload source could not be determined
    #[error("Cannot read source {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Download destination is already present on disk
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// External client could not be started
    #[error("Could not execute {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the client's output failed
    #[error("Could not read output stream from process: {0}")]
    StreamReadFailed(#[source] std::io::Error),

    /// Waiting for the client was interrupted
    #[error("Process interrupted")]
    Interrupted,

    /// Client exited with a code outside the known set
    #[error("Process exited with exit code {0}")]
    FatalExitCode(i32),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidReference(_) | Error::DestinationExists(_) => 2, // UsageError
            Error::ConfigurationMissing | Error::Config(_) | Error::TomlParse(_) => 3, // ConfigError
            Error::SourceUnreadable { .. }
            | Error::SpawnFailed { .. }
            | Error::StreamReadFailed(_)
            | Error::FatalExitCode(_) => 5, // ClientFailure
            Error::Interrupted => 130,                                     // Interrupted
            Error::Io(_) => 1,                                             // GeneralError
        }
    }
}
