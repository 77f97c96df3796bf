//! Exit code definitions for the s3prov CLI
//!
//! Scripts rely on these values. Changing one is a breaking change.

/// Exit codes for the s3prov CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,

    /// General/unspecified error
    GeneralError = 1,

    /// User input error: malformed reference, destination already present
    UsageError = 2,

    /// Plugin settings missing or invalid
    ConfigError = 3,

    /// s3cmd reported an expected failure (object missing, access denied, ...)
    NotTransferred = 4,

    /// s3cmd could not run or exited with an unknown code
    ClientFailure = 5,

    /// Operation was interrupted (e.g., Ctrl+C)
    Interrupted = 130,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::ConfigError),
            4 => Some(Self::NotTransferred),
            5 => Some(Self::ClientFailure),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    /// Exit code for a provisioning error
    pub fn from_error(err: &sp_core::Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid reference or destination",
            Self::ConfigError => "Plugin settings missing or invalid",
            Self::NotTransferred => "Transfer not completed",
            Self::ClientFailure => "s3cmd failed",
            Self::Interrupted => "Operation interrupted",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
