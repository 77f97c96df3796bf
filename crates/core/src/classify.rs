//! Exit code classification
//!
//! Maps the raw exit code of the s3cmd client to a provisioning outcome.
//! See https://github.com/s3tools/s3cmd/blob/master/S3/ExitCodes.py for the
//! meaning of the client's codes.
//!
//! The default recoverable set covers local data and I/O failures only. A
//! missing object (`EX_NOTFOUND`, 12) or denied access (`EX_ACCESSDENIED`,
//! 77) is fatal unless the host lists those codes under
//! `recoverable-exit-codes`, e.g. `"12,65,71,74,75,77"`.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Exit codes treated as an ordinary negative result by default
/// (EX_DATAERR, EX_OSERR, EX_IOERR, EX_TEMPFAIL)
pub const DEFAULT_RECOVERABLE_EXIT_CODES: [i32; 4] = [65, 71, 74, 75];

/// Classification of a client exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Exit code 0
    Success,
    /// Known, expected failure
    RecoverableFailure(i32),
    /// Anything else
    FatalError(i32),
}

/// Set of exit codes considered recoverable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPolicy {
    recoverable: BTreeSet<i32>,
}

impl ExitPolicy {
    /// Create a policy with a custom recoverable set
    pub fn new(recoverable: impl IntoIterator<Item = i32>) -> Self {
        Self {
            recoverable: recoverable.into_iter().collect(),
        }
    }

    pub fn classify(&self, code: i32) -> ExitClass {
        if code == 0 {
            ExitClass::Success
        } else if self.recoverable.contains(&code) {
            ExitClass::RecoverableFailure(code)
        } else {
            ExitClass::FatalError(code)
        }
    }

    /// Convert an exit code into the boolean provisioning result
    ///
    /// Fatal codes are returned as [`Error::FatalExitCode`] and must abort the
    /// operation.
    pub fn outcome(&self, code: i32) -> Result<bool> {
        match self.classify(code) {
            ExitClass::Success => Ok(true),
            ExitClass::RecoverableFailure(_) => Ok(false),
            ExitClass::FatalError(code) => Err(Error::FatalExitCode(code)),
        }
    }
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RECOVERABLE_EXIT_CODES)
    }
}
