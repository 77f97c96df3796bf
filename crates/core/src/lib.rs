//! sp-core: Core library for the s3cmd provisioning plugin
//!
//! This crate provides everything that does not touch a process:
//! - Configuration resolution and the settings file
//! - Reference parsing and scheme rewriting
//! - s3cmd command construction
//! - Exit code classification
//! - The Provision, Plugin and Executor traits
//!
//! Process execution lives in sp-s3cmd, behind the Executor trait.

pub mod classify;
pub mod command;
pub mod config;
pub mod error;
pub mod path;
pub mod traits;

pub use classify::{ExitClass, ExitPolicy};
pub use command::{
    CommandBuilder, CommandKind, Invocation, UploadPlan, chunk_size_for, chunk_size_mb_for,
};
pub use config::{ClientConfig, Defaults, SettingsManager, Verbosity};
pub use error::{Error, Result};
pub use path::{ProvisionRef, SCHEME};
pub use traits::{Executor, Plugin, Provision};
