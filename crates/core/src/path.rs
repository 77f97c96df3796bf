//! Reference parsing and scheme rewriting
//!
//! Handles references in the format: s3cmd://bucket[/key]
//! The s3cmd client itself only understands s3://, so every reference is
//! rewritten to that prefix before it reaches the command line.

use crate::error::{Error, Result};

/// Scheme identifier claimed by this plugin
pub const SCHEME: &str = "s3cmd";

/// Prefix of references handed to the plugin
pub const PLUGIN_PREFIX: &str = "s3cmd://";

/// Prefix understood by the s3cmd client
pub const CLIENT_PREFIX: &str = "s3://";

/// A parsed remote reference pointing to an S3 location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRef {
    /// Everything after the scheme prefix, unmodified
    path: String,
    /// First path segment
    bucket: String,
}

impl ProvisionRef {
    /// Parse a reference using the plugin scheme
    ///
    /// References already written with the client prefix are accepted as-is.
    pub fn parse(reference: &str) -> Result<Self> {
        let path = reference
            .strip_prefix(PLUGIN_PREFIX)
            .or_else(|| reference.strip_prefix(CLIENT_PREFIX))
            .ok_or_else(|| {
                Error::InvalidReference(format!(
                    "'{reference}' does not start with {PLUGIN_PREFIX}"
                ))
            })?;

        let bucket = path.split('/').next().unwrap_or_default();
        if bucket.is_empty() {
            return Err(Error::InvalidReference(format!(
                "'{reference}' does not name a bucket"
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Full reference with the client prefix (s3://bucket/key)
    pub fn client_uri(&self) -> String {
        format!("{CLIENT_PREFIX}{}", self.path)
    }

    /// Bucket reference with the client prefix (s3://bucket)
    pub fn bucket_uri(&self) -> String {
        format!("{CLIENT_PREFIX}{}", self.bucket)
    }
}

impl std::fmt::Display for ProvisionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{PLUGIN_PREFIX}{}", self.path)
    }
}
