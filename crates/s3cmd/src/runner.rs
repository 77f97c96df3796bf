//! Process runner
//!
//! Spawns one s3cmd process with stdout and stderr sharing a single pipe, so
//! the client's output arrives as one stream in the order it was written.
//! The pipe is drained while waiting for the process to exit, so a chatty
//! process can never block on a full pipe.

use std::io::Read;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use sp_core::{Error, Executor, Invocation, Result};

use crate::console::{Console, LineSplitter, render_line};

/// Read buffer size for the output pipes
const READ_BUF_SIZE: usize = 8 * 1024;

/// Handle used to interrupt a running command from elsewhere
///
/// An interrupt raised while nothing is running is kept and ends the next
/// command as soon as it starts.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    notify: Arc<Notify>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.notify.notify_one();
    }
}

/// Runs s3cmd invocations as child processes
#[derive(Debug, Default)]
pub struct ProcessRunner {
    console: Console,
    interrupt: InterruptHandle,
}

impl ProcessRunner {
    /// Runner echoing to stdout
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner echoing to a custom console
    pub fn with_console(console: Console) -> Self {
        Self {
            console,
            interrupt: InterruptHandle::default(),
        }
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Execute one invocation and return its exit code
    ///
    /// The code is not interpreted here. On Unix a process killed by a signal
    /// reports `128 + signal`.
    pub async fn run(&self, invocation: &Invocation) -> Result<i32> {
        info!("Executing command: {invocation}");
        let program = invocation.program().display().to_string();

        let spawn_failed = |source: std::io::Error| Error::SpawnFailed {
            program: program.clone(),
            source,
        };
        let (reader, writer) = std::io::pipe().map_err(spawn_failed)?;
        let stderr_writer = writer.try_clone().map_err(spawn_failed)?;

        // the Command holding the write ends is dropped at the end of this
        // statement, so the reader sees EOF once the child closes its copies
        let mut child = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer)
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_failed)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let reader_task = tokio::task::spawn_blocking(move || forward_lines(reader, tx));

        let mut completion = Box::pin(async {
            let (status, ()) = tokio::join!(child.wait(), self.drain(rx, invocation));
            join_reader(reader_task).await?;
            Ok::<_, Error>(exit_code(status?))
        });

        let outcome = tokio::select! {
            result = &mut completion => Some(result),
            () = self.interrupt.notify.notified() => None,
        };
        drop(completion);

        match outcome {
            Some(result) => {
                let code = result?;
                debug!(code, "{program} exited");
                Ok(code)
            }
            None => {
                warn!("Process interrupted, stopping {program}");
                if let Err(e) = child.kill().await {
                    warn!("Could not stop {program}: {e}");
                }
                Err(Error::Interrupted)
            }
        }
    }

    /// Consume the output lines until the pipe is closed
    async fn drain(&self, mut lines: mpsc::UnboundedReceiver<String>, invocation: &Invocation) {
        while let Some(line) = lines.recv().await {
            trace!(target: "s3cmd", "{line}");
            if invocation.echo() {
                self.console.write(&render_line(&line));
            }
        }
        // terminate the in-place progress line
        if invocation.echo() && invocation.kind().is_transfer() {
            self.console.write("\n");
        }
    }
}

#[async_trait]
impl Executor for ProcessRunner {
    async fn execute(&self, invocation: &Invocation) -> Result<i32> {
        self.run(invocation).await
    }
}

/// Read `reader` to EOF, sending every line to `tx`
///
/// Keeps reading after the receiver is gone so the child never blocks.
fn forward_lines(mut reader: impl Read, tx: mpsc::UnboundedSender<String>) -> std::io::Result<()> {
    let mut splitter = LineSplitter::default();
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for line in splitter.push(&buf[..n]) {
            let _ = tx.send(line);
        }
    }
    if let Some(line) = splitter.finish() {
        let _ = tx.send(line);
    }
    Ok(())
}

/// Wait for the reader task, turning any failure into `StreamReadFailed`
async fn join_reader(task: JoinHandle<std::io::Result<()>>) -> Result<()> {
    task.await
        .map_err(|e| Error::StreamReadFailed(std::io::Error::other(e)))?
        .map_err(Error::StreamReadFailed)
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use sp_core::CommandKind;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn runner() -> (ProcessRunner, SharedBuf) {
        let buf = SharedBuf::default();
        (ProcessRunner::with_console(Console::new(buf.clone())), buf)
    }

    fn sh(script: &str, kind: CommandKind, echo: bool) -> Invocation {
        Invocation::new("sh", ["-c", script], kind, echo)
    }

    #[tokio::test]
    async fn test_exit_code_is_returned_raw() {
        let (runner, _) = runner();
        let code = runner
            .run(&sh("exit 3", CommandKind::BucketInfo, false))
            .await
            .unwrap();
        assert_eq!(code, 3);

        let code = runner
            .run(&sh("true", CommandKind::BucketInfo, false))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let (runner, _) = runner();
        let invocation = Invocation::new(
            "/nonexistent/bin/s3cmd",
            ["info", "s3://bucket"],
            CommandKind::BucketInfo,
            false,
        );
        let result = runner.run(&invocation).await;
        match result {
            Err(Error::SpawnFailed { program, .. }) => {
                assert_eq!(program, "/nonexistent/bin/s3cmd")
            }
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_large_output_is_fully_drained() {
        let (runner, buf) = runner();
        let code = runner
            .run(&sh(
                "seq 1 50000; echo done >&2",
                CommandKind::MakeBucket,
                true,
            ))
            .await
            .unwrap();
        assert_eq!(code, 0);

        let out = buf.contents();
        assert_eq!(out.matches('\r').count(), 50001);
        assert!(out.contains("\r50000"));
        assert!(out.contains("\rdone"));
        assert!(!out.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_transfer_progress_echo() {
        let (runner, buf) = runner();
        let script = r"printf 'download: a -> b\n10%%\r20%%\n'";
        let code = runner.run(&sh(script, CommandKind::Get, true)).await.unwrap();
        assert_eq!(code, 0);
        assert_eq!(buf.contents(), "download: a -> b\n\r10%\r20%\n");
    }

    #[tokio::test]
    async fn test_silent_invocation_writes_nothing() {
        let (runner, buf) = runner();
        let code = runner
            .run(&sh("echo hidden; exit 12", CommandKind::Put, false))
            .await
            .unwrap();
        assert_eq!(code, 12);
        assert!(buf.contents().is_empty());
    }

    #[tokio::test]
    async fn test_signal_exit_code() {
        let (runner, _) = runner();
        let code = runner
            .run(&sh("kill -9 $$", CommandKind::BucketInfo, false))
            .await
            .unwrap();
        assert_eq!(code, 137);
    }

    #[tokio::test]
    async fn test_interrupt_stops_the_wait() {
        let (runner, _) = runner();
        let handle = runner.interrupt_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            handle.interrupt();
        });

        let started = Instant::now();
        let result = runner
            .run(&sh("exec sleep 30", CommandKind::Get, false))
            .await;
        assert!(matches!(result, Err(Error::Interrupted)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_keep_their_order() {
        let (runner, buf) = runner();
        let script = "echo a; echo b >&2; echo c; echo d >&2; echo e";
        for _ in 0..20 {
            let code = runner
                .run(&sh(script, CommandKind::MakeBucket, true))
                .await
                .unwrap();
            assert_eq!(code, 0);
        }
        assert_eq!(buf.contents(), "\ra\rb\rc\rd\re".repeat(20));
    }

    /// Yields one line, then fails
    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::other("pipe broke"));
            }
            self.sent = true;
            let line = b"partial\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_stream_read_failed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task =
            tokio::task::spawn_blocking(move || forward_lines(FailingReader { sent: false }, tx));

        match join_reader(task).await {
            Err(Error::StreamReadFailed(e)) => assert_eq!(e.to_string(), "pipe broke"),
            other => panic!("expected stream read failure, got {other:?}"),
        }
        assert_eq!(rx.recv().await.as_deref(), Some("partial"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_panicking_reader_is_stream_read_failed() {
        let task = tokio::task::spawn_blocking(|| -> std::io::Result<()> { panic!("reader died") });
        assert!(matches!(
            join_reader(task).await,
            Err(Error::StreamReadFailed(_))
        ));
    }
}
