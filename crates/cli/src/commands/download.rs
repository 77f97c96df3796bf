//! download command - Fetch a remote object
//!
//! Downloads an s3cmd://bucket/key reference to a local path that must not
//! exist yet.

use std::path::PathBuf;

use clap::Args;
use sp_core::Provision;

use super::report_transfer;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Download a remote object
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Source reference (s3cmd://bucket/key)
    pub source: String,

    /// Local destination, including the file name
    pub destination: PathBuf,
}

/// Execute the download command
pub async fn execute(
    args: DownloadArgs,
    provision: &impl Provision,
    formatter: &Formatter,
) -> ExitCode {
    let result = provision
        .download_from(&args.source, &args.destination)
        .await;
    report_transfer(
        result,
        args.source,
        args.destination.display().to_string(),
        formatter,
    )
}
