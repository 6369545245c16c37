//! Child process execution with a timeout and bounded output capture.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct ChildOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes discarded beyond the output limit (stdout + stderr).
    pub truncated: usize,
    pub timed_out: bool,
}

impl ChildOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run `cmd`, feed `stdin`, and wait at most `timeout` (unbounded when `None`).
///
/// Both pipes are drained on reader threads while the child runs so a chatty
/// child cannot block on a full pipe. Bytes past `output_limit_bytes` are
/// counted and dropped.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs()), output_limit_bytes))]
pub fn run_with_input(
    mut cmd: Command,
    stdin: &[u8],
    timeout: Option<Duration>,
    output_limit_bytes: usize,
) -> Result<ChildOutput> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd.spawn().context("spawn command")?;

    {
        let mut child_stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("stdin was not piped"))?;
        if let Err(err) = child_stdin.write_all(stdin) {
            drop(child_stdin);
            warn!(error = %err, "writing stdin failed, killing child");
            // The child may already have exited; reap it either way.
            let _ = child.kill();
            let _ = child.wait();
            return Err(err).context("write stdin");
        }
        // Dropping the handle closes stdin so the child sees EOF.
    }

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let stdout_handle = thread::spawn(move || read_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
        None => child.wait().context("wait for command")?,
    };

    let (stdout, stdout_dropped) = join_reader(stdout_handle).context("join stdout")?;
    let (stderr, stderr_dropped) = join_reader(stderr_handle).context("join stderr")?;
    let truncated = stdout_dropped + stderr_dropped;
    if truncated > 0 {
        warn!(truncated, "command output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(ChildOutput {
        status,
        stdout,
        stderr,
        truncated,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit.saturating_sub(buf.len()));
        buf.extend_from_slice(&chunk[..keep]);
        dropped += n - keep;
    }

    Ok((buf, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn echoes_stdin_back() {
        let output = run_with_input(sh("cat"), b"{\"word\":\"air\"}", None, 1024).expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_text(), "{\"word\":\"air\"}");
        assert_eq!(output.truncated, 0);
    }

    #[test]
    fn truncates_beyond_limit() {
        let output = run_with_input(sh("printf 'abcdef'"), b"", None, 4).expect("run");
        assert_eq!(output.stdout_text(), "abcd");
        assert_eq!(output.truncated, 2);
    }

    #[test]
    fn kills_on_timeout() {
        let output = run_with_input(
            sh("sleep 5"),
            b"",
            Some(Duration::from_millis(100)),
            1024,
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(!output.status.success());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn child_that_ignores_stdin_is_reaped_on_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exit 0", pid_file.display());
        let input = vec![b'x'; 4 * 1024 * 1024];

        let err = run_with_input(sh(&script), &input, None, 1024).unwrap_err();
        assert!(format!("{err:#}").contains("write stdin"));

        let pid = std::fs::read_to_string(&pid_file).expect("pid file");
        let proc_entry = std::path::Path::new("/proc").join(pid.trim());
        assert!(!proc_entry.exists(), "child {} left as a zombie", pid.trim());
    }
}
