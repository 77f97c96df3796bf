//! Output formatting utilities
//!
//! Formatters for CLI messages in human-readable and JSON formats. Progress
//! from s3cmd itself is echoed by the process runner, not here.

mod formatter;

pub use formatter::Formatter;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
