//! upload command - Store a local file or directory
//!
//! Uploads to an s3cmd://bucket/key reference, creating the bucket when it
//! does not exist yet.

use std::path::PathBuf;

use clap::Args;
use sp_core::Provision;

use super::report_transfer;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Upload a local file or directory
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local source file or directory
    pub source: PathBuf,

    /// Destination reference (s3cmd://bucket/key or s3cmd://bucket/dir/)
    pub destination: String,

    /// Metadata to attach (accepted, not sent to s3cmd)
    #[arg(long)]
    pub metadata: Option<String>,
}

/// Execute the upload command
pub async fn execute(
    args: UploadArgs,
    provision: &impl Provision,
    formatter: &Formatter,
) -> ExitCode {
    if args.metadata.is_some() {
        formatter.warning("Metadata is not forwarded to s3cmd and will be ignored");
    }

    let result = provision
        .upload_to(&args.destination, &args.source, args.metadata.as_deref())
        .await;
    report_transfer(
        result,
        args.source.display().to_string(),
        args.destination,
        formatter,
    )
}
