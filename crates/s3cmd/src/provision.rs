//! s3cmd provisioner
//!
//! Implements the Provision contract by sequencing the commands built by
//! sp-core through an Executor and classifying the final exit code.
//!
//! Bucket creation is check-then-create and not atomic: two first uploads to
//! the same new bucket may both try to create it. The losing `mb` is logged
//! and the transfer is attempted regardless.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use sp_core::{
    ClientConfig, CommandBuilder, Defaults, Error, Executor, ExitPolicy, Provision, Result, SCHEME,
};

use crate::runner::ProcessRunner;

/// Provisions files through the s3cmd client
#[derive(Debug)]
pub struct S3cmdProvision<E = ProcessRunner> {
    builder: CommandBuilder,
    policy: ExitPolicy,
    executor: E,
}

impl S3cmdProvision<ProcessRunner> {
    /// Build a provisioner from the host's settings mapping
    pub fn from_settings(
        settings: Option<&HashMap<String, String>>,
        defaults: &Defaults,
    ) -> Result<Self> {
        let config = ClientConfig::resolve(settings, defaults)?;
        Ok(Self::new(&config, ProcessRunner::new()))
    }
}

impl<E: Executor> S3cmdProvision<E> {
    pub fn new(config: &ClientConfig, executor: E) -> Self {
        Self {
            builder: CommandBuilder::new(config),
            policy: config.exit_policy.clone(),
            executor,
        }
    }
}

#[async_trait]
impl<E: Executor> Provision for S3cmdProvision<E> {
    fn schemes_handled(&self) -> BTreeSet<String> {
        BTreeSet::from([SCHEME.to_string()])
    }

    async fn download_from(&self, source: &str, destination: &Path) -> Result<bool> {
        if destination.exists() {
            return Err(Error::DestinationExists(destination.to_path_buf()));
        }

        let invocation = self.builder.download(source, destination)?;
        let code = self.executor.execute(&invocation).await?;
        self.policy.outcome(code)
    }

    async fn upload_to(
        &self,
        destination: &str,
        source: &Path,
        metadata: Option<&str>,
    ) -> Result<bool> {
        if metadata.is_some() {
            debug!("Metadata is not forwarded to s3cmd");
        }

        let plan = self.builder.upload_plan(source, destination)?;
        info!(
            size = %humansize::format_size(plan.size_bytes, humansize::BINARY),
            "Uploading {} to {destination}",
            source.display()
        );

        if self.executor.execute(&plan.check).await? == 0 {
            info!("Bucket exists");
        } else {
            let code = self.executor.execute(&plan.create).await?;
            if code == 0 {
                info!("Bucket created");
            } else {
                warn!(code, "Bucket creation failed, attempting transfer anyway");
            }
        }

        let code = self.executor.execute(&plan.transfer).await?;
        self.policy.outcome(code)
    }
}
