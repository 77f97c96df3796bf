//! Host-facing trait definitions
//!
//! `Provision` is the contract the hosting environment calls, `Plugin` the
//! lifecycle it drives, and `Executor` the seam between command construction
//! and process execution so the provisioning flow can be tested without
//! spawning anything.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::command::Invocation;
use crate::error::Result;

/// Runs one external command and reports its raw exit code
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, invocation: &Invocation) -> Result<i32>;
}

/// File provisioning contract exposed to the host
///
/// `Ok(false)` is an ordinary negative result (object missing, access
/// denied). Anything the host must not ignore is an error.
#[async_trait]
pub trait Provision: Send + Sync {
    /// Scheme identifiers this provisioner claims
    fn schemes_handled(&self) -> BTreeSet<String>;

    /// Download the remote `source` to the local `destination` (including file name)
    async fn download_from(&self, source: &str, destination: &Path) -> Result<bool>;

    /// Upload the local `source` to the remote `destination`
    ///
    /// `metadata` is accepted for interface compatibility and not forwarded.
    async fn upload_to(
        &self,
        destination: &str,
        source: &Path,
        metadata: Option<&str>,
    ) -> Result<bool>;
}

/// Lifecycle notifications from the hosting runtime
pub trait Plugin {
    fn start(&self);
    fn stop(&self);
}
