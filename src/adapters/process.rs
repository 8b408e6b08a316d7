//! Subprocess execution with a deadline and cooperative cancellation.
//!
//! The child's pipes are drained on dedicated threads so a chatty tool can
//! never block on a full pipe while we poll for its exit. On unix the child
//! leads its own process group, so anything it starts (the `node` behind a
//! pip-installed pyright, say) is killed along with it.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// Minimum time left to collect buffered output once the child has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(250);
const STDERR_EXCERPT_LEN: usize = 400;

/// Shared flag set on user interrupt. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// First few hundred bytes of stderr, for error messages.
    pub fn stderr_excerpt(&self) -> String {
        let text = String::from_utf8_lossy(&self.stderr);
        let trimmed = text.trim();
        match trimmed.char_indices().nth(STDERR_EXCERPT_LEN) {
            Some((idx, _)) => format!("{}...", &trimmed[..idx]),
            None => trimmed.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ProcessError {
    Spawn(io::Error),
    Wait(io::Error),
    Timeout,
    Cancelled,
}

/// Run `command` to completion, killing it and everything it started when
/// `timeout` elapses or `cancel` is set.
///
/// The child is always reaped before returning, and the call never outlives
/// the deadline by more than a poll interval plus a short drain grace.
/// Processes the child leaves behind after exiting are killed too.
pub fn run_with_deadline(
    command: &mut Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ProcessOutput, ProcessError> {
    if cancel.is_cancelled() {
        return Err(ProcessError::Cancelled);
    }

    isolate_process_group(command);
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ProcessError::Spawn)?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + timeout;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                kill_tree(&mut child);
                return Err(ProcessError::Wait(e));
            }
        }
        if cancel.is_cancelled() {
            debug!(pid = child.id(), "killing process group after cancellation");
            kill_tree(&mut child);
            return Err(ProcessError::Cancelled);
        }
        if Instant::now() >= deadline {
            debug!(pid = child.id(), "killing process group after timeout");
            kill_tree(&mut child);
            return Err(ProcessError::Timeout);
        }
        thread::sleep(POLL_INTERVAL);
    };

    // Leftovers would otherwise hold our pipes open.
    kill_group(&child);

    let drain_deadline = deadline.max(Instant::now() + DRAIN_GRACE);
    let stdout = collect(stdout, drain_deadline).ok_or(ProcessError::Timeout)?;
    let stderr = collect(stderr, drain_deadline).ok_or(ProcessError::Timeout)?;
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

/// Reader thread for one pipe. The thread ends once every writer is gone,
/// whether or not anyone is still waiting on the receiver.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error leaves whatever was captured so far.
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// `None` when the pipe is still open at `deadline`.
fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    let Some(rx) = pipe else {
        return Some(Vec::new());
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

#[cfg(unix)]
fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_command: &mut Command) {}

/// Signal every process still in the child's group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        return;
    };
    // ESRCH just means the group is already empty.
    let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn kill_tree(child: &mut Child) {
    kill_group(child);
    // Ignore errors - the child may already have exited
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }

    #[test]
    fn test_captures_stdout_and_status() {
        let output = run_with_deadline(
            &mut sh("echo hello; echo oops >&2; exit 1"),
            Duration::from_secs(10),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
        assert_eq!(output.stderr_excerpt(), "oops");
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let result = run_with_deadline(
            &mut sh("exec sleep 10"),
            Duration::from_millis(200),
            &CancellationToken::new(),
        );

        assert!(matches!(result, Err(ProcessError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancellation_kills_child() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let result = run_with_deadline(&mut sh("exec sleep 10"), Duration::from_secs(30), &token);
        canceller.join().unwrap();

        assert!(matches!(result, Err(ProcessError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_already_cancelled_does_not_spawn() {
        let token = CancellationToken::new();
        token.cancel();
        let result = run_with_deadline(
            &mut Command::new("definitely-not-a-real-binary-xyz"),
            Duration::from_secs(1),
            &token,
        );
        assert!(matches!(result, Err(ProcessError::Cancelled)));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let result = run_with_deadline(
            &mut Command::new("definitely-not-a-real-binary-xyz"),
            Duration::from_secs(1),
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(ProcessError::Spawn(_))));
    }

    fn marker_exists_later(marker: &std::path::Path) -> bool {
        thread::sleep(Duration::from_millis(1500));
        marker.exists()
    }

    #[test]
    fn test_timeout_kills_grandchildren() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("grandchild-finished");
        let script = format!("sh -c 'sleep 1; touch {}'; true", marker.display());

        let started = Instant::now();
        let result = run_with_deadline(
            &mut sh(&script),
            Duration::from_millis(300),
            &CancellationToken::new(),
        );

        assert!(matches!(result, Err(ProcessError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!marker_exists_later(&marker));
    }

    #[test]
    fn test_cancellation_kills_grandchildren() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("grandchild-finished");
        let script = format!("sh -c 'sleep 1; touch {}'; true", marker.display());

        let token = CancellationToken::new();
        let trigger = token.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let result = run_with_deadline(&mut sh(&script), Duration::from_secs(30), &token);
        canceller.join().unwrap();

        assert!(matches!(result, Err(ProcessError::Cancelled)));
        assert!(!marker_exists_later(&marker));
    }

    #[test]
    fn test_background_leftover_does_not_hold_pipes() {
        let started = Instant::now();
        let output = run_with_deadline(
            &mut sh("sleep 5 & echo done"),
            Duration::from_secs(3),
            &CancellationToken::new(),
        )
        .unwrap();

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "done");
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
