use crate::trace::TraceWriter;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

/// How long a cancelled child gets to honor SIGTERM before it is killed.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(2500);

/// Failure modes of a single child-process invocation.
///
/// Messages never include the argument list, which may carry tokens.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start process '{file_name}'")]
    Launch {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process '{file_name}'")]
    Wait {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process '{file_name}' was cancelled")]
    Cancelled { file_name: String },

    #[error("exit code {exit_code} returned from process '{file_name}'")]
    ExitCode { file_name: String, exit_code: i32 },
}

impl ProcessError {
    /// Whether the invocation ended because the cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProcessError::Cancelled { .. })
    }
}

/// Spawns a child process that shares the parent's stdout/stderr, waits for
/// it, and tears it down (SIGTERM, then SIGKILL) when the cancellation token
/// fires.
pub struct ProcessInvoker {
    trace: Arc<dyn TraceWriter>,
    kill_grace: Duration,
}

impl ProcessInvoker {
    /// Create a new `ProcessInvoker` with the given trace writer.
    pub fn new(trace: Arc<dyn TraceWriter>) -> Self {
        Self {
            trace,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// Override how long to wait after SIGTERM before force killing.
    pub fn with_kill_grace(mut self, kill_grace: Duration) -> Self {
        self.kill_grace = kill_grace;
        self
    }

    /// Run `file_name` with `arguments` in `working_directory` and wait for it.
    ///
    /// Arguments are passed through verbatim, one per element. Standard output
    /// and error are inherited, stdin is closed. A non-zero exit status is an
    /// error. If `cancellation_token` fires first the child is terminated and
    /// `ProcessError::Cancelled` is returned once it has been reaped.
    pub async fn execute(
        &self,
        working_directory: &Path,
        file_name: &Path,
        arguments: &[String],
        cancellation_token: CancellationToken,
    ) -> Result<(), ProcessError> {
        let display_name = file_name.display().to_string();

        self.trace.info("Starting process:");
        self.trace.info(&format!("  File name: '{display_name}'"));
        self.trace
            .info(&format!("  Arguments: '{}'", arguments.join(" ")));
        self.trace.verbose(&format!(
            "  Working directory: '{}'",
            working_directory.display()
        ));

        if cancellation_token.is_cancelled() {
            self.trace.info("Cancellation requested before start.");
            return Err(ProcessError::Cancelled {
                file_name: display_name,
            });
        }

        let mut cmd = Command::new(file_name);
        cmd.args(arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if working_directory.is_dir() {
            cmd.current_dir(working_directory);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| ProcessError::Launch {
            file_name: display_name.clone(),
            source,
        })?;

        let pid = child.id().unwrap_or(0);
        self.trace.info(&format!(
            "Process started with process id {pid}, waiting for process exit."
        ));

        let outcome = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancellation_token.cancelled() => None,
        };

        let status = match outcome {
            Some(Ok(status)) => status,
            Some(Err(source)) => {
                return Err(ProcessError::Wait {
                    file_name: display_name,
                    source,
                })
            }
            None => {
                self.trace.info("Cancellation requested.");
                self.terminate(&mut child).await;
                self.trace.info(&format!(
                    "Process {pid} cancelled after {:.2?}.",
                    start.elapsed()
                ));
                return Err(ProcessError::Cancelled {
                    file_name: display_name,
                });
            }
        };

        // Killed by a signal: no exit code.
        let exit_code = status.code().unwrap_or(-1);
        self.trace.info(&format!(
            "Finished process {pid} with exit code {exit_code}, and elapsed time {:.2?}.",
            start.elapsed()
        ));

        if exit_code != 0 {
            return Err(ProcessError::ExitCode {
                file_name: display_name,
                exit_code,
            });
        }

        Ok(())
    }

    /// SIGTERM, wait up to the grace period, then SIGKILL. Always reaps.
    async fn terminate(&self, child: &mut Child) {
        if self.send_term_and_wait(child).await {
            self.trace
                .info("Process terminated successfully through SIGTERM.");
            return;
        }

        self.trace
            .info("Process ignored the terminate signal, killing it.");
        if let Err(e) = child.kill().await {
            self.trace.warning(&format!("Failed to kill process: {e}"));
        }
    }

    /// Returns `true` if the process exited within the grace period.
    #[cfg(unix)]
    async fn send_term_and_wait(&self, child: &mut Child) -> bool {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let pid = match child.id() {
            Some(id) => id,
            // Already reaped.
            None => return true,
        };

        self.trace.verbose(&format!("Sending SIGTERM to process {pid}."));
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            self.trace
                .info(&format!("SIGTERM failed to send to process {pid}: {e}"));
            return false;
        }

        match tokio::time::timeout(self.kill_grace, child.wait()).await {
            Ok(result) => result.is_ok(),
            Err(_) => {
                self.trace.info(&format!(
                    "Process did not honor SIGTERM within {:.1}s.",
                    self.kill_grace.as_secs_f64()
                ));
                false
            }
        }
    }

    #[cfg(not(unix))]
    async fn send_term_and_wait(&self, _child: &mut Child) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::testing::{CollectingTraceWriter, NullTraceWriter};
    use std::path::PathBuf;

    fn make_invoker() -> ProcessInvoker {
        ProcessInvoker::new(Arc::new(NullTraceWriter))
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn execute_success() {
        let invoker = make_invoker();
        let result = invoker
            .execute(
                Path::new(""),
                Path::new("true"),
                &[],
                CancellationToken::new(),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn execute_nonzero_exit_is_error() {
        let invoker = make_invoker();
        let err = invoker
            .execute(
                Path::new(""),
                Path::new("sh"),
                &args(&["-c", "exit 3"]),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        match err {
            ProcessError::ExitCode { exit_code, .. } => assert_eq!(exit_code, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_is_launch_error() {
        let invoker = make_invoker();
        let err = invoker
            .execute(
                Path::new(""),
                Path::new("nonexistent_command_xyz_123"),
                &[],
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Launch { .. }));
    }

    #[tokio::test]
    async fn execute_uses_working_directory_and_verbatim_args() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = make_invoker();
        invoker
            .execute(
                dir.path(),
                Path::new("sh"),
                &args(&["-c", "pwd -P > cwd.txt; printf '%s' \"$1\" > arg.txt", "sh", "two words"]),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let cwd = std::fs::read_to_string(dir.path().join("cwd.txt")).unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(PathBuf::from(cwd.trim()), expected);

        let arg = std::fs::read_to_string(dir.path().join("arg.txt")).unwrap();
        assert_eq!(arg, "two words");
    }

    #[tokio::test]
    async fn cancellation_terminates_child_promptly() {
        let invoker = make_invoker();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            invoker.execute(Path::new(""), Path::new("sleep"), &args(&["30"]), cancel),
        )
        .await
        .expect("execute should return after cancellation");

        let err = result.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_escalates_to_kill_when_term_is_ignored() {
        let writer = Arc::new(CollectingTraceWriter::default());
        let invoker = ProcessInvoker::new(writer.clone())
            .with_kill_grace(Duration::from_millis(300));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            invoker.execute(
                Path::new(""),
                Path::new("sh"),
                &args(&["-c", "trap '' TERM; while true; do sleep 1; done"]),
                cancel,
            ),
        )
        .await
        .expect("execute should return after kill");

        assert!(result.unwrap_err().is_cancelled());
        assert!(writer.contains("did not honor SIGTERM"));
    }

    #[tokio::test]
    async fn already_cancelled_token_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = make_invoker();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = invoker
            .execute(
                dir.path(),
                Path::new("sh"),
                &args(&["-c", "touch ran"]),
                cancel,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!dir.path().join("ran").exists());
    }

    #[test]
    fn error_messages_do_not_carry_arguments() {
        let err = ProcessError::ExitCode {
            file_name: "/opt/runner/config.sh".into(),
            exit_code: 1,
        };
        assert_eq!(
            err.to_string(),
            "exit code 1 returned from process '/opt/runner/config.sh'"
        );
    }
}
