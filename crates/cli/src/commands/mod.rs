//! CLI command definitions and execution
//!
//! The CLI hosts the s3cmd plugin: it resolves the plugin settings, drives
//! the start/stop lifecycle around a single command, and turns the outcome
//! into an exit code.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sp_core::config::{CLIENT_KEY, CONFIG_FILE_KEY, VERBOSITY_KEY};
use sp_core::{ClientConfig, Defaults, Plugin, SettingsManager, Verbosity};
use sp_s3cmd::{ProcessRunner, RuntimeMode, S3cmdPlugin, S3cmdProvision};
use tracing::debug;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
mod download;
mod schemes;
mod upload;

/// s3prov - provision files through s3cmd
///
/// Downloads and uploads s3cmd://bucket/key references by running the s3cmd
/// command-line client.
#[derive(Parser, Debug)]
#[command(name = "s3prov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Plugin runtime mode
    #[arg(long, global = true, env = "S3PROV_MODE", default_value = "deployment")]
    pub mode: RuntimeMode,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the s3cmd settings come from
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Plugin settings file (TOML with an [s3cmd] table)
    #[arg(long, global = true, env = "S3PROV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the s3cmd executable (overrides the settings file)
    #[arg(long, global = true)]
    pub client: Option<String>,

    /// Path to the s3cmd configuration file (overrides the settings file)
    #[arg(long, global = true)]
    pub s3cfg: Option<String>,

    /// Echo verbosity: minimal or normal (overrides the settings file)
    #[arg(long, global = true)]
    pub verbosity: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Plugin(PluginCommand),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Commands served by the s3cmd plugin
#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Download a remote object to a local path
    Download(download::DownloadArgs),

    /// Upload a local file or directory to a remote reference
    Upload(upload::UploadArgs),

    /// List the URI schemes handled by the plugin
    Schemes,
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let formatter = Formatter::new(OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    });

    match cli.command {
        Commands::Completions(args) => completions::execute(args),
        Commands::Plugin(command) => {
            let machine_output = cli.json || cli.quiet;
            match client_config(&cli.settings, machine_output) {
                Ok(config) => run_plugin(command, &config, cli.mode, &formatter).await,
                Err(e) => {
                    formatter.error(&format!("{e:#}"));
                    e.downcast_ref::<sp_core::Error>()
                        .map(ExitCode::from_error)
                        .unwrap_or(ExitCode::ConfigError)
                }
            }
        }
    }
}

/// Run one plugin command between the start and stop lifecycle hooks
async fn run_plugin(
    command: PluginCommand,
    config: &ClientConfig,
    mode: RuntimeMode,
    formatter: &Formatter,
) -> ExitCode {
    debug!(
        client = %config.client.display(),
        s3cfg = %config.config_file.display(),
        "Resolved s3cmd settings"
    );

    let runner = ProcessRunner::new();
    let interrupt = runner.interrupt_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.interrupt();
        }
    });
    let provision = S3cmdProvision::new(config, runner);

    let plugin = S3cmdPlugin::new(mode);
    plugin.start();
    let exit_code = match command {
        PluginCommand::Download(args) => download::execute(args, &provision, formatter).await,
        PluginCommand::Upload(args) => upload::execute(args, &provision, formatter).await,
        PluginCommand::Schemes => schemes::execute(&provision, formatter),
    };
    plugin.stop();

    exit_code
}

/// Resolve the s3cmd client configuration from the settings file and flags
///
/// Flags override file values. With neither, the configuration is missing.
/// `machine_output` (JSON or quiet) keeps s3cmd progress off stdout.
pub fn client_config(args: &SettingsArgs, machine_output: bool) -> anyhow::Result<ClientConfig> {
    let manager = match &args.config {
        Some(path) => SettingsManager::with_path(path),
        None => SettingsManager::new()?,
    };
    let mut settings = manager.load().with_context(|| {
        format!(
            "Failed to load settings from {}",
            manager.settings_path().display()
        )
    })?;

    let overrides = [
        (CLIENT_KEY, &args.client),
        (CONFIG_FILE_KEY, &args.s3cfg),
        (VERBOSITY_KEY, &args.verbosity),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            settings
                .get_or_insert_with(HashMap::new)
                .insert(key.to_string(), value.clone());
        }
    }

    let mut config = ClientConfig::resolve(settings.as_ref(), &Defaults::from_env())?;
    if machine_output {
        config.verbosity = Verbosity::Minimal;
    }
    Ok(config)
}

/// JSON result of a transfer command
#[derive(Debug, Serialize)]
struct TransferOutput {
    status: &'static str,
    source: String,
    target: String,
}

/// Report the result of a download or upload
fn report_transfer(
    result: sp_core::Result<bool>,
    source: String,
    target: String,
    formatter: &Formatter,
) -> ExitCode {
    match result {
        Ok(true) => {
            if formatter.is_json() {
                formatter.json(&TransferOutput {
                    status: "success",
                    source,
                    target,
                });
            } else {
                formatter.success(&format!("{source} -> {target}"));
            }
            ExitCode::Success
        }
        Ok(false) => {
            if formatter.is_json() {
                formatter.json(&TransferOutput {
                    status: "failed",
                    source,
                    target,
                });
            } else {
                formatter.error(&format!("Transfer failed: {source} -> {target}"));
            }
            ExitCode::NotTransferred
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}
