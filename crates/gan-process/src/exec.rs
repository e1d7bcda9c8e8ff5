//! Spawn and two-phase-termination primitives. The byte-level capture
//! loop and deadline/shutdown race live in [`crate::manager`]; this
//! module only owns the parts that talk directly to the OS process.

use crate::error::ProcessError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::warn;

/// One subprocess invocation request handed to the Process Manager.
#[derive(Debug, Clone)]
pub struct ExecuteSpec {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

/// Result of one subprocess call. `timed_out` is reported independently
/// of `exit_code` — a call can be timed out with a captured exit code of
/// `124` (the conventional timeout sentinel) even though the process did
/// eventually produce a code before force-kill landed.
#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub duration: Duration,
    pub timed_out: bool,
    pub pid: Option<u32>,
}

/// Build the `tokio::process::Command` for a spec: piped stdio, isolated
/// process group via `setsid`, `kill_on_drop` as a last-resort safety
/// net if the manager itself is dropped mid-call.
pub(crate) fn build_command(spec: &ExecuteSpec) -> Command {
    let mut cmd = Command::new(&spec.executable);
    cmd.args(&spec.args);
    if let Some(cwd) = &spec.cwd {
        cmd.current_dir(cwd);
    }
    cmd.env_clear();
    for (k, v) in &spec.env {
        cmd.env(k, v);
    }
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    cmd.stdin(if spec.stdin.is_some() {
        std::process::Stdio::piped()
    } else {
        std::process::Stdio::null()
    });
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    cmd
}

/// Spawn the child and, if stdin bytes were supplied, write them once
/// and close the handle. Standard input is written exactly once and
/// then closed.
pub(crate) async fn spawn_child(
    spec: &ExecuteSpec,
) -> Result<tokio::process::Child, ProcessError> {
    let mut cmd = build_command(spec);
    let mut child = cmd.spawn()?;

    if let Some(data) = spec.stdin.clone() {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&data).await.ok();
            stdin.shutdown().await.ok();
        } else {
            warn!("stdin was requested but no piped stdin handle was available");
        }
    }

    Ok(child)
}

/// Send `SIGTERM` to the whole process group; returns immediately.
pub(crate) fn send_graceful_terminate(child: &tokio::process::Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: kill() is async-signal-safe; negative PID targets the group.
            unsafe {
                libc::kill(-(pid as i32), libc::SIGTERM);
            }
            return;
        }
    }
    let _ = child;
}

/// Force-kill the whole process group. Always safe to call even if the
/// process has already exited (`kill` on a reaped pid is a harmless ESRCH).
pub(crate) fn send_force_kill(child: &mut tokio::process::Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(-(pid as i32), libc::SIGKILL);
            }
            return;
        }
    }
    let _ = child.start_kill();
}
