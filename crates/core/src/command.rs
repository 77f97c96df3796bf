//! s3cmd command construction
//!
//! Builds the exact argument lists handed to the s3cmd client. Arguments are
//! kept as a list end to end, so paths containing spaces need no escaping.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::path::ProvisionRef;

const MIB: u64 = 1024 * 1024;

/// Maximum number of parts in a multipart upload (S3 limit)
pub const MAX_PARTS: u64 = 10_000;

/// Chunk sizes offered to s3cmd, in MiB, smallest first
///
/// 15 MiB is the client's own default, 5 GiB the S3 maximum part size.
pub const CHUNK_SIZE_TIERS_MB: [u64; 5] = [15, 50, 100, 500, 5120];

/// Pick the multipart chunk size, in MiB, for an upload of `size_bytes`
///
/// Returns the smallest tier whose 10,000 parts cover the file, or the
/// largest tier when none does.
pub fn chunk_size_mb_for(size_bytes: u64) -> u64 {
    CHUNK_SIZE_TIERS_MB
        .iter()
        .copied()
        .find(|tier| size_bytes <= tier * MIB * MAX_PARTS)
        .unwrap_or(CHUNK_SIZE_TIERS_MB[CHUNK_SIZE_TIERS_MB.len() - 1])
}

/// The chunk size argument passed to `s3cmd put`
pub fn chunk_size_for(size_bytes: u64) -> String {
    format!("--multipart-chunk-size-mb={}", chunk_size_mb_for(size_bytes))
}

/// What an invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `s3cmd info s3://bucket`
    BucketInfo,
    /// `s3cmd mb s3://bucket`
    MakeBucket,
    /// `s3cmd get`
    Get,
    /// `s3cmd put`
    Put,
}

impl CommandKind {
    /// Whether the command moves data and reports progress
    pub const fn is_transfer(self) -> bool {
        matches!(self, Self::Get | Self::Put)
    }
}

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    kind: CommandKind,
    echo: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I, kind: CommandKind, echo: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            kind,
            echo,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Whether output should be echoed to the console
    pub fn echo(&self) -> bool {
        self.echo
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in display_args(&self.args) {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Commands needed to satisfy one upload, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    /// Bucket existence check
    pub check: Invocation,
    /// Bucket creation, run only when the check fails
    pub create: Invocation,
    /// The transfer itself
    pub transfer: Invocation,
    /// Measured size of the source
    pub size_bytes: u64,
}

/// Builds s3cmd invocations for one client configuration
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    client: PathBuf,
    config_file: PathBuf,
    echo_transfers: bool,
}

impl CommandBuilder {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: config.client.clone(),
            config_file: config.config_file.clone(),
            echo_transfers: config.echo_transfers(),
        }
    }

    fn invocation<I, S>(&self, kind: CommandKind, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut all: Vec<OsString> = vec!["-c".into(), self.config_file.clone().into()];
        all.extend(args.into_iter().map(Into::into));
        let echo = kind.is_transfer() && self.echo_transfers;
        Invocation::new(self.client.clone(), all, kind, echo)
    }

    /// `s3cmd -c <cfg> get s3://bucket/key <destination> --force`
    pub fn download(&self, source: &str, destination: &Path) -> Result<Invocation> {
        let source = ProvisionRef::parse(source)?;
        Ok(self.invocation(
            CommandKind::Get,
            [
                OsString::from("get"),
                source.client_uri().into(),
                destination.as_os_str().to_owned(),
                "--force".into(),
            ],
        ))
    }

    /// `s3cmd -c <cfg> info s3://bucket`
    pub fn bucket_info(&self, target: &ProvisionRef) -> Invocation {
        self.invocation(CommandKind::BucketInfo, ["info".to_string(), target.bucket_uri()])
    }

    /// `s3cmd -c <cfg> mb s3://bucket`
    pub fn make_bucket(&self, target: &ProvisionRef) -> Invocation {
        self.invocation(CommandKind::MakeBucket, ["mb".to_string(), target.bucket_uri()])
    }

    /// `s3cmd -c <cfg> put <source> s3://bucket/key --multipart-chunk-size-mb=N [--recursive]`
    pub fn put(
        &self,
        source: &Path,
        target: &ProvisionRef,
        size_bytes: u64,
        recursive: bool,
    ) -> Invocation {
        let mut args = vec![
            OsString::from("put"),
            source.as_os_str().to_owned(),
            target.client_uri().into(),
            chunk_size_for(size_bytes).into(),
        ];
        if recursive {
            args.push("--recursive".into());
        }
        self.invocation(CommandKind::Put, args)
    }

    /// Build every command an upload needs
    ///
    /// Fails with [`Error::SourceUnreadable`] when the source cannot be
    /// measured, so nothing is executed for an unreadable source.
    pub fn upload_plan(&self, source: &Path, destination: &str) -> Result<UploadPlan> {
        let target = ProvisionRef::parse(destination)?;
        let metadata = std::fs::metadata(source).map_err(|e| unreadable(source, e))?;
        let recursive = metadata.is_dir();
        let size_bytes = if recursive {
            directory_size(source)?
        } else {
            metadata.len()
        };

        Ok(UploadPlan {
            check: self.bucket_info(&target),
            create: self.make_bucket(&target),
            transfer: self.put(source, &target, size_bytes, recursive),
            size_bytes,
        })
    }
}

fn unreadable(path: &Path, source: std::io::Error) -> Error {
    Error::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    }
}

/// Total size of the files below `dir`
fn directory_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    let entries = std::fs::read_dir(dir).map_err(|e| unreadable(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| unreadable(dir, e))?;
        let path = entry.path();
        let metadata = std::fs::metadata(&path).map_err(|e| unreadable(&path, e))?;
        total += if metadata.is_dir() {
            directory_size(&path)?
        } else {
            metadata.len()
        };
    }
    Ok(total)
}

/// Lossy view of the arguments, as shown in log lines
pub fn display_args(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}
