//! Console echo of client output
//!
//! s3cmd draws an interactive progress bar with carriage returns. Captured
//! through a pipe those arrive as separate lines, so they are redrawn here:
//! lines opening a transfer are printed on their own line, everything else
//! overwrites the current line in place.

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Line prefixes s3cmd uses when a transfer starts
pub const PROGRESS_START_MARKERS: [&str; 2] = ["download", "upload"];

/// Whether a line opens a new transfer
pub fn is_progress_start(line: &str) -> bool {
    PROGRESS_START_MARKERS
        .iter()
        .any(|marker| line.starts_with(marker))
}

/// Text written to the console for one line of client output
pub fn render_line(line: &str) -> String {
    if is_progress_start(line) {
        format!("{line}\n")
    } else {
        format!("\r{line}")
    }
}

/// Shared, cloneable console writer
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    /// Console writing to the process stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write and flush; failures are logged, never propagated
    pub fn write(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            warn!("Console writer poisoned, dropping output");
            return;
        };
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!("Could not write to console: {e}");
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// Splits a byte stream into lines terminated by `\n`, `\r` or `\r\n`
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
    after_cr: bool,
}

impl LineSplitter {
    /// Feed a chunk, returning every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            match byte {
                b'\n' if self.after_cr => self.after_cr = false,
                b'\n' | b'\r' => {
                    lines.push(self.take());
                    self.after_cr = byte == b'\r';
                }
                _ => {
                    self.pending.push(byte);
                    self.after_cr = false;
                }
            }
        }
        lines
    }

    /// Flush an unterminated last line
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    fn take(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_progress_start() {
        assert_eq!(
            render_line("download: 's3://b/k' -> 'out'"),
            "download: 's3://b/k' -> 'out'\n"
        );
        assert_eq!(render_line("upload: 'f' -> 's3://b/f'"), "upload: 'f' -> 's3://b/f'\n");
    }

    #[test]
    fn test_render_progress_update() {
        assert_eq!(render_line(" 1024 of 2048    50% in 0s"), "\r 1024 of 2048    50% in 0s");
        assert_eq!(render_line("ERROR: S3 error: 404"), "\rERROR: S3 error: 404");
    }

    #[test]
    fn test_split_all_terminators() {
        let mut splitter = LineSplitter::default();
        let lines = splitter.push(b"a\nb\rc\r\nd");
        assert_eq!(lines, ["a", "b", "c"]);
        assert_eq!(splitter.finish().as_deref(), Some("d"));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_split_crlf_across_chunks() {
        let mut splitter = LineSplitter::default();
        assert_eq!(splitter.push(b"first\r"), ["first"]);
        assert_eq!(splitter.push(b"\nsecond\n"), ["second"]);
    }

    #[test]
    fn test_split_keeps_blank_lines() {
        let mut splitter = LineSplitter::default();
        assert_eq!(splitter.push(b"\n\nx\n"), ["", "", "x"]);
    }

    #[test]
    fn test_split_multibyte_across_chunks() {
        let mut splitter = LineSplitter::default();
        let text = "größe\n".as_bytes();
        assert!(splitter.push(&text[..3]).is_empty());
        assert_eq!(splitter.push(&text[3..]), ["größe"]);
    }
}
