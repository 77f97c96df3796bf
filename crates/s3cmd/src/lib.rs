//! sp-s3cmd: s3cmd process adapter for the provisioning plugin
//!
//! This crate runs the commands built by sp-core as child processes and
//! implements the Provision and Plugin traits on top of them. It is the only
//! crate that spawns processes.

pub mod console;
pub mod plugin;
pub mod provision;
pub mod runner;

pub use console::Console;
pub use plugin::{RuntimeMode, S3cmdPlugin};
pub use provision::S3cmdProvision;
pub use runner::{InterruptHandle, ProcessRunner};
