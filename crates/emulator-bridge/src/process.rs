//! Interactive Tool Process
//!
//! `avdmanager create avd` may stop on a "custom hardware profile?" prompt
//! and wait for an answer, or may exit without printing anything. The
//! conversation here copes with both without hanging:
//!
//! 1. wait a short settle delay
//! 2. peek the first stdout bytes without consuming them
//! 3. EOF: nothing to answer, go straight to the exit status
//! 4. otherwise, if the child is still running, answer with a newline
//! 5. drain stdout, wait for exit, collect stderr

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use avdkit_core::{AvdError, Result};

/// Handshake steps, reported as they start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    ProbeOutput,
    Respond,
    SkipRespond,
    Drain,
    AwaitExit,
}

/// What the tool said and how it ended
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    /// Output was pending after the settle delay
    pub prompted: bool,
    /// A newline was written to the tool's stdin
    pub responded: bool,
}

/// Run `cmd` through the prompt handshake, calling `on_step` as each step
/// begins.
///
/// The child is killed and reaped before this returns, whatever the outcome.
/// Cancelling `cancel` yields [`AvdError::CreationInterrupted`].
pub async fn converse<F>(
    mut cmd: Command,
    settle_delay: Duration,
    cancel: &CancellationToken,
    mut on_step: F,
) -> Result<ToolOutput>
where
    F: FnMut(HandshakeStep) + Send,
{
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(AvdError::CreationAborted)?;
    debug!("Spawned tool process {:?}", child.id());

    let stdin = child.stdin.take();
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    // Drained concurrently so a chatty stderr cannot fill its pipe and stall the child
    let stderr_task = tokio::spawn(collect(stderr));

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AvdError::CreationInterrupted),
        outcome = handshake(&mut child, stdin, stdout, settle_delay, &mut on_step) => {
            outcome.map_err(AvdError::CreationAborted)
        }
    };

    if let Err(e) = &result {
        debug!("Handshake ended early: {}", e);
        if let Err(kill_err) = child.start_kill() {
            debug!("Kill after failed handshake: {}", kill_err);
        }
    }
    if let Err(e) = child.wait().await {
        warn!("Failed to reap tool process: {}", e);
    }

    let (status, stdout, prompted, responded) = match result {
        Ok(done) => done,
        Err(e) => {
            stderr_task.abort();
            return Err(e);
        }
    };

    let stderr = match stderr_task.await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return Err(AvdError::CreationAborted(e)),
        Err(e) => return Err(AvdError::CreationAborted(io::Error::new(io::ErrorKind::Other, e))),
    };

    Ok(ToolOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        prompted,
        responded,
    })
}

async fn handshake<F>(
    child: &mut Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    settle_delay: Duration,
    on_step: &mut F,
) -> io::Result<(ExitStatus, Vec<u8>, bool, bool)>
where
    F: FnMut(HandshakeStep) + Send,
{
    tokio::time::sleep(settle_delay).await;

    on_step(HandshakeStep::ProbeOutput);
    let mut reader = BufReader::new(stdout);
    let prompted = !reader.fill_buf().await?.is_empty();

    let running = prompted && child.try_wait()?.is_none();
    let responded = match stdin {
        Some(stdin) if running => {
            on_step(HandshakeStep::Respond);
            respond(stdin).await?
        }
        stdin => {
            if prompted {
                debug!("Tool printed output and exited, not responding");
            } else {
                debug!("No output from tool, waiting for exit");
            }
            on_step(HandshakeStep::SkipRespond);
            drop(stdin);
            false
        }
    };

    on_step(HandshakeStep::Drain);
    let mut output = Vec::new();
    reader.read_to_end(&mut output).await?;

    on_step(HandshakeStep::AwaitExit);
    let status = child.wait().await?;
    debug!("Tool exited with {}", status);

    Ok((status, output, prompted, responded))
}

/// Accept the default answer. The pipe closes when `stdin` drops.
async fn respond(mut stdin: ChildStdin) -> io::Result<bool> {
    debug!("Tool is waiting for input, sending newline");
    let written = async {
        stdin.write_all(b"\n").await?;
        stdin.flush().await
    }
    .await;

    match written {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("Tool exited before the newline was written");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn collect<R: AsyncRead + Unpin>(mut stream: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}

fn missing_pipe(name: &str) -> AvdError {
    AvdError::CreationAborted(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("tool {} was not captured", name),
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    const SETTLE: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_silent_success() {
        let out = converse(sh("exit 0"), SETTLE, &CancellationToken::new(), |_| {}).await.unwrap();
        assert!(out.status.success());
        assert!(!out.prompted);
        assert!(!out.responded);
    }

    #[tokio::test]
    async fn test_silent_failure() {
        let out = converse(sh("echo oops >&2; exit 1"), SETTLE, &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert!(!out.status.success());
        assert!(!out.prompted);
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_prompt_answered() {
        let script = "printf 'Do you wish to create a custom hardware profile? [no] '; read answer; echo done";
        let mut steps = Vec::new();
        let out = converse(sh(script), SETTLE, &CancellationToken::new(), |step| steps.push(step))
            .await
            .unwrap();
        assert!(out.status.success());
        assert!(out.prompted);
        assert!(out.responded);
        // The peeked prompt is part of the drained output
        assert!(out.stdout.starts_with("Do you wish"));
        assert!(out.stdout.ends_with("done\n"));
        assert_eq!(
            steps,
            [
                HandshakeStep::ProbeOutput,
                HandshakeStep::Respond,
                HandshakeStep::Drain,
                HandshakeStep::AwaitExit
            ]
        );
    }

    #[tokio::test]
    async fn test_output_then_exit_not_answered() {
        let mut steps = Vec::new();
        // Long enough for the shell to be gone before the liveness check
        let settle = Duration::from_millis(300);
        let out = converse(sh("printf x; exit 0"), settle, &CancellationToken::new(), |step| {
            steps.push(step)
        })
        .await
        .unwrap();
        assert!(out.status.success());
        assert!(out.prompted);
        assert!(!out.responded);
        assert_eq!(out.stdout, "x");
        assert_eq!(
            steps,
            [
                HandshakeStep::ProbeOutput,
                HandshakeStep::SkipRespond,
                HandshakeStep::Drain,
                HandshakeStep::AwaitExit
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_kills_child() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = converse(sh("printf '?'; sleep 30"), SETTLE, &cancel, |_| {}).await.unwrap_err();
        assert!(matches!(err, AvdError::CreationInterrupted));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let cmd = Command::new("/nonexistent/avdmanager");
        let err = converse(cmd, SETTLE, &CancellationToken::new(), |_| {}).await.unwrap_err();
        assert!(matches!(err, AvdError::CreationAborted(_)));
    }
}
