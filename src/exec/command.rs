// src/exec/command.rs

//! Shell command steps.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::step::Step;

/// Build a step that runs `cmd` through the platform shell.
///
/// The step succeeds when the process exits with status 0. Any other exit,
/// or a failure to spawn, fails the step with a message naming the command.
pub fn command_step(cmd: impl Into<String>) -> Step {
    let cmd: String = cmd.into();
    let cmd: Arc<str> = Arc::from(cmd);
    let label = format!("cmd({cmd})");

    Step::labelled(label, move || {
        let cmd = Arc::clone(&cmd);
        async move { run_command(&cmd).await }
    })
}

async fn run_command(cmd_line: &str) -> Result<()> {
    info!(cmd = %cmd_line, "starting command");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for command `{}`", cmd_line))?;

    // Always consume both pipes so buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        spawn_line_logger(cmd_line.to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_logger(cmd_line.to_string(), "stderr", stderr);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of command `{}`", cmd_line))?;

    let code = status.code().unwrap_or(-1);
    info!(
        cmd = %cmd_line,
        exit_code = code,
        success = status.success(),
        "command exited"
    );

    if !status.success() {
        bail!("command `{}` exited with status {}", cmd_line, code);
    }
    Ok(())
}

fn spawn_line_logger<R>(cmd_line: String, stream: &'static str, pipe: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(cmd = %cmd_line, stream, "{}", line);
        }
    });
}
