//! Integration tests for the s3prov CLI
//!
//! These tests run the built binary against a stand-in s3cmd: a shell script
//! that keeps buckets as directories under a scratch store and answers the
//! `info`, `mb`, `put` and `get` subcommands with s3cmd's exit codes.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const FAKE_S3CMD: &str = r##"#!/bin/sh
root="$FAKE_S3_ROOT"
[ "$1" = "-c" ] || exit 64
shift 2
echo "$*" >> "$root/.calls"
cmd="$1"
shift
case "$cmd" in
info)
    bucket="${1#s3://}"
    if [ ! -d "$root/$bucket" ]; then
        echo "ERROR: Bucket '$bucket' does not exist" >&2
        exit 12
    fi
    echo "$1 (bucket):"
    ;;
mb)
    bucket="${1#s3://}"
    mkdir -p "$root/$bucket" || exit 77
    echo "Bucket '$1/' created"
    ;;
put)
    src="$1"
    key="${2#s3://}"
    bucket="${key%%/*}"
    [ -d "$root/$bucket" ] || exit 12
    case "$key" in
    */) key="$key$(basename "$src")" ;;
    esac
    mkdir -p "$(dirname "$root/$key")"
    echo "upload: '$src' -> 's3://$key'"
    cp "$src" "$root/$key" || exit 74
    printf ' 100%% done\r'
    ;;
get)
    key="${1#s3://}"
    if [ ! -f "$root/$key" ]; then
        echo "ERROR: S3 error: 404 (Not Found)" >&2
        exit 12
    fi
    echo "download: 's3://$key' -> '$2'"
    mkdir -p "$(dirname "$2")"
    cp "$root/$key" "$2" || exit 74
    ;;
*)
    exit 64
    ;;
esac
"##;

/// Scratch directory holding the fake client, its store and the settings file
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self::with_settings("")
    }

    fn with_settings(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let sandbox = Self { dir };

        std::fs::create_dir_all(sandbox.store()).unwrap();
        std::fs::create_dir_all(sandbox.path("bin")).unwrap();
        std::fs::write(sandbox.path(".s3cfg"), "[default]\n").unwrap();

        let client = sandbox.path("bin/s3cmd");
        std::fs::write(&client, FAKE_S3CMD).unwrap();
        std::fs::set_permissions(&client, std::fs::Permissions::from_mode(0o755)).unwrap();

        let settings = format!(
            "schema_version = 1\n\n[s3cmd]\nclient = '{}'\nconfig-file-location = '{}'\n{extra}",
            client.display(),
            sandbox.path(".s3cfg").display(),
        );
        std::fs::write(sandbox.settings(), settings).unwrap();
        sandbox
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn store(&self) -> PathBuf {
        self.path("store")
    }

    fn settings(&self) -> PathBuf {
        self.path("config.toml")
    }

    fn write_input(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path("inputFilesDirectory").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_settings(&self.settings(), args)
    }

    fn run_with_settings(&self, settings: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_s3prov"))
            .arg("--config")
            .arg(settings)
            .arg("--no-color")
            .args(args)
            .env("FAKE_S3_ROOT", self.store())
            .env_remove("S3PROV_CONFIG")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute s3prov")
    }

    /// Subcommands the fake client received, in order
    fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.store().join(".calls"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_upload_file_to_file_then_download() {
    let sandbox = Sandbox::new();
    let source = sandbox.write_input("file.txt", "provisioned content\n");
    let source_arg = source.to_str().unwrap();

    let output = sandbox.run(&["upload", source_arg, "s3cmd://test-bucket1/file2.txt"]);
    assert!(output.status.success(), "upload failed: {}", stderr(&output));

    let calls = sandbox.calls();
    assert_eq!(calls.len(), 3, "unexpected calls: {calls:?}");
    assert_eq!(calls[0], "info s3://test-bucket1");
    assert_eq!(calls[1], "mb s3://test-bucket1");
    assert_eq!(
        calls[2],
        format!("put {source_arg} s3://test-bucket1/file2.txt --multipart-chunk-size-mb=15")
    );
    assert!(stdout(&output).contains("upload: "));

    let destination = sandbox.path("outputFilesDirectory1/file3.txt");
    assert!(!destination.exists());
    let output = sandbox.run(&[
        "download",
        "s3cmd://test-bucket1/file2.txt",
        destination.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "download failed: {}", stderr(&output));
    assert!(stdout(&output).contains("download: 's3://test-bucket1/file2.txt'"));
    assert_eq!(
        std::fs::read_to_string(&destination).unwrap(),
        "provisioned content\n"
    );
}

#[test]
fn test_upload_to_existing_bucket_skips_creation() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.store().join("existing")).unwrap();
    let source = sandbox.write_input("file.txt", "x");

    let output = sandbox.run(&["upload", source.to_str().unwrap(), "s3cmd://existing/a.txt"]);
    assert!(output.status.success(), "upload failed: {}", stderr(&output));

    let calls = sandbox.calls();
    assert_eq!(calls.len(), 2, "unexpected calls: {calls:?}");
    assert!(calls[0].starts_with("info "));
    assert!(calls[1].starts_with("put "));
}

#[test]
fn test_upload_file_to_directory() {
    let sandbox = Sandbox::new();
    let source = sandbox.write_input("file.txt", "directory upload");

    let output = sandbox.run(&["upload", source.to_str().unwrap(), "s3cmd://test-bucket2/"]);
    assert!(output.status.success(), "upload failed: {}", stderr(&output));

    let destination = sandbox.path("outputFilesDirectory2/file2.txt");
    let output = sandbox.run(&[
        "download",
        "s3cmd://test-bucket2/file.txt",
        destination.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "download failed: {}", stderr(&output));
    assert_eq!(
        std::fs::read_to_string(&destination).unwrap(),
        "directory upload"
    );
}

#[test]
fn test_paths_with_spaces_round_trip() {
    let sandbox = Sandbox::new();
    let source = sandbox.write_input("my file.txt", "spaced");

    let output = sandbox.run(&["upload", source.to_str().unwrap(), "s3cmd://spaces/"]);
    assert!(output.status.success(), "upload failed: {}", stderr(&output));
    assert!(sandbox.store().join("spaces/my file.txt").exists());

    let destination = sandbox.path("out dir/my copy.txt");
    let output = sandbox.run(&[
        "download",
        "s3cmd://spaces/my file.txt",
        destination.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "download failed: {}", stderr(&output));
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "spaced");
}

#[test]
fn test_download_to_existing_destination_is_rejected() {
    let sandbox = Sandbox::new();
    let destination = sandbox.write_input("already-here.txt", "keep me");

    let output = sandbox.run(&[
        "download",
        "s3cmd://bucket/file.txt",
        destination.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(sandbox.calls().is_empty());
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "keep me");
}

#[test]
fn test_download_missing_object_is_fatal_by_default() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.store().join("bucket")).unwrap();

    let destination = sandbox.path("out/missing.txt");
    let output = sandbox.run(&[
        "download",
        "s3cmd://bucket/missing.txt",
        destination.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("exit code 12"));
}

#[test]
fn test_download_missing_object_when_configured_recoverable() {
    let sandbox = Sandbox::with_settings("recoverable-exit-codes = '12,65,71,74,75'\n");
    std::fs::create_dir_all(sandbox.store().join("bucket")).unwrap();

    let destination = sandbox.path("out/missing.txt");
    let output = sandbox.run(&[
        "--json",
        "download",
        "s3cmd://bucket/missing.txt",
        destination.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(4));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["source"], "s3cmd://bucket/missing.txt");
    assert!(!destination.exists());
}

#[test]
fn test_missing_settings_fail_fast() {
    let sandbox = Sandbox::new();
    let output = sandbox.run_with_settings(
        &sandbox.path("nonexistent.toml"),
        &["download", "s3cmd://bucket/file.txt", "/tmp/never-written.txt"],
    );
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Configuration missing"));
    assert!(sandbox.calls().is_empty());
}

#[test]
fn test_missing_client_binary() {
    let sandbox = Sandbox::new();
    let destination = sandbox.path("out.txt");
    let output = sandbox.run(&[
        "--client",
        "/nonexistent/bin/s3cmd",
        "download",
        "s3cmd://bucket/file.txt",
        destination.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("Could not execute /nonexistent/bin/s3cmd"));
}

#[test]
fn test_invalid_reference() {
    let sandbox = Sandbox::new();
    let destination = sandbox.path("out.txt");
    let output = sandbox.run(&[
        "download",
        "gs://bucket/file.txt",
        destination.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(sandbox.calls().is_empty());
}

#[test]
fn test_schemes_json() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["--json", "schemes"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["schemes"], serde_json::json!(["s3cmd"]));
}
