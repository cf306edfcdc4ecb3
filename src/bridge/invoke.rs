//! Subprocess invocation: spawn, write stdin, wait, capture, enforce the
//! deadline.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{BridgeError, ProcessSpec};

/// Env var carrying the zero-based generation index.
pub const GENERATION_INDEX_ENV: &str = "CLI_GENERATION_INDEX";

/// Env var carrying the total requested completion count.
pub const TOTAL_GENERATIONS_ENV: &str = "CLI_TOTAL_GENERATIONS";

/// Grace period between SIGTERM and SIGKILL when a deadline expires.
const KILL_GRACE: std::time::Duration = std::time::Duration::from_millis(500);

/// Bounded wait for pipe readers after a kill. Orphaned grandchildren can
/// hold the pipes open past this point; whatever was pumped so far is kept.
const PIPE_DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// Buffer shared between a pipe reader task and the invocation.
type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Which sample of a multi-completion request an invocation serves.
///
/// Exposed to the process via [`GENERATION_INDEX_ENV`] and
/// [`TOTAL_GENERATIONS_ENV`] so a sampler can vary temperature or seed per
/// sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSlot {
    /// Zero-based index of this sample.
    pub index: usize,
    /// Total number of requested samples.
    pub total: usize,
}

impl GenerationSlot {
    /// Slot for sample `index` of `total`.
    #[must_use]
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }

    /// The only slot of a single-completion request.
    #[must_use]
    pub fn single() -> Self {
        Self::new(0, 1)
    }
}

/// Captured output of one finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// Decoded stdout text.
    pub stdout: String,
    /// Decoded stderr text.
    pub stderr: String,
    /// Exit code; -1 when the process died to a signal.
    pub exit_code: i32,
}

impl InvocationResult {
    /// Whether the process reported success.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes one external command per completion, fresh process every call.
///
/// The spec is captured once and shared read-only across invocations; each
/// invocation owns its own child, pipes, and deadline clock. There is no
/// pooling, no warm reuse, and no retry; callers decide whether to retry.
#[derive(Debug, Clone)]
pub struct CliBridge {
    spec: ProcessSpec,
}

impl CliBridge {
    /// Create a bridge over the given spec.
    #[must_use]
    pub fn new(spec: ProcessSpec) -> Self {
        Self { spec }
    }

    /// The underlying spec.
    #[must_use]
    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    /// Describe the bridge configuration as a plain JSON map.
    #[must_use]
    pub fn dump_state(&self) -> serde_json::Map<String, serde_json::Value> {
        self.spec.dump_state()
    }

    /// Run the command once, write `payload` to its stdin, and return its
    /// stdout text.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::NotFound`] when the executable cannot be launched.
    /// - [`BridgeError::Timeout`] when the deadline elapses; the process is
    ///   killed first and the error carries partial output.
    /// - [`BridgeError::ExitStatus`] on a non-zero exit, carrying full
    ///   stdout and stderr.
    /// - [`BridgeError::Io`] for other pipe or wait failures.
    pub async fn invoke(&self, payload: &str, slot: GenerationSlot) -> Result<String, BridgeError> {
        let result = self.invoke_raw(payload, slot).await?;
        if result.success() {
            Ok(result.stdout)
        } else {
            Err(BridgeError::ExitStatus {
                command: self.spec.display_command(),
                code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            })
        }
    }

    /// Like [`invoke`](Self::invoke) but without exit-code checking; returns
    /// the captured streams and code for the caller to interpret.
    ///
    /// # Errors
    ///
    /// Same spawn, timeout, and I/O failures as [`invoke`](Self::invoke).
    pub async fn invoke_raw(
        &self,
        payload: &str,
        slot: GenerationSlot,
    ) -> Result<InvocationResult, BridgeError> {
        let invocation = Uuid::new_v4();
        tracing::debug!(
            %invocation,
            command = %self.spec.display_command(),
            index = slot.index,
            total = slot.total,
            "Spawning CLI process"
        );

        let mut child = self.spawn(slot)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Io(std::io::Error::other("child stdin unavailable")))?;
        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::Io(std::io::Error::other("child stdout unavailable")))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| BridgeError::Io(std::io::Error::other("child stderr unavailable")))?;

        // Stdin is written from its own task so a child that exits without
        // reading cannot deadlock the wait; dropping the handle closes the
        // pipe. Stdout/stderr are pumped incrementally into shared buffers
        // so partial output survives a kill.
        let input = payload.as_bytes().to_vec();
        let stdin_task = tokio::spawn(write_stdin(stdin, input));
        let stdout_buffer = SharedBuffer::default();
        let stderr_buffer = SharedBuffer::default();
        let stdout_task = tokio::spawn(pump(stdout_pipe, Arc::clone(&stdout_buffer)));
        let stderr_task = tokio::spawn(pump(stderr_pipe, Arc::clone(&stderr_buffer)));

        let status = match self.spec.timeout() {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited.map_err(BridgeError::Io)?,
                Err(_) => {
                    tracing::warn!(
                        %invocation,
                        timeout_secs = limit.as_secs_f64(),
                        "Deadline elapsed, killing CLI process"
                    );
                    terminate(&mut child).await;
                    stdin_task.abort();
                    let _ = tokio::time::timeout(PIPE_DRAIN_TIMEOUT, async {
                        let _ = stdout_task.await;
                        let _ = stderr_task.await;
                    })
                    .await;
                    return Err(BridgeError::Timeout {
                        command: self.spec.display_command(),
                        timeout: limit,
                        stdout: snapshot(&stdout_buffer).await,
                        stderr: snapshot(&stderr_buffer).await,
                    });
                }
            },
            None => child.wait().await.map_err(BridgeError::Io)?,
        };

        // A child may legitimately exit without consuming stdin; a broken
        // pipe here is not a failure of the invocation.
        let _ = stdin_task.await;

        join_pump(stdout_task).await?;
        join_pump(stderr_task).await?;
        let stdout = snapshot(&stdout_buffer).await;
        let stderr = snapshot(&stderr_buffer).await;
        let exit_code = status.code().unwrap_or(-1);
        tracing::debug!(%invocation, exit_code, "CLI process finished");

        Ok(InvocationResult {
            stdout,
            stderr,
            exit_code,
        })
    }

    /// Blocking variant of [`invoke`](Self::invoke), for synchronous
    /// callers. Runs the async path on a private current-thread runtime.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Same failures as [`invoke`](Self::invoke).
    pub fn invoke_blocking(
        &self,
        payload: &str,
        slot: GenerationSlot,
    ) -> Result<String, BridgeError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BridgeError::Io)?;
        runtime.block_on(self.invoke(payload, slot))
    }

    fn spawn(&self, slot: GenerationSlot) -> Result<Child, BridgeError> {
        let mut cmd = Command::new(&self.spec.command()[0]);
        cmd.args(&self.spec.command()[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // An abandoned await must not leave an orphan running.
            .kill_on_drop(true);

        if let Some(dir) = self.spec.working_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in self.spec.env() {
            cmd.env(key, value);
        }
        cmd.env(GENERATION_INDEX_ENV, slot.index.to_string());
        cmd.env(TOTAL_GENERATIONS_ENV, slot.total.to_string());

        cmd.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotFound {
                    command: self.spec.display_command(),
                }
            } else {
                BridgeError::Io(err)
            }
        })
    }
}

async fn write_stdin(mut stdin: tokio::process::ChildStdin, input: Vec<u8>) -> std::io::Result<()> {
    stdin.write_all(&input).await?;
    stdin.shutdown().await
}

/// Copy a pipe into the shared buffer until EOF. The lock is only held per
/// chunk, so the buffer stays readable while the reader is blocked.
async fn pump<R: AsyncRead + Unpin>(mut pipe: R, buffer: SharedBuffer) -> std::io::Result<()> {
    let mut chunk = [0u8; 8192];
    loop {
        let read = pipe.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.lock().await.extend_from_slice(&chunk[..read]);
    }
}

/// Decode a shared buffer lossily. Invalid bytes become replacement
/// characters rather than failures.
async fn snapshot(buffer: &SharedBuffer) -> String {
    String::from_utf8_lossy(&buffer.lock().await).into_owned()
}

/// Propagate read failures from a finished pump task.
async fn join_pump(handle: JoinHandle<std::io::Result<()>>) -> Result<(), BridgeError> {
    handle
        .await
        .map_err(|err| BridgeError::Io(std::io::Error::other(err)))?
        .map_err(BridgeError::Io)
}

/// Terminate a child that has outlived its deadline.
///
/// On unix, SIGTERM first with a short grace period, then SIGKILL. Other
/// platforms kill immediately.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            let _ = kill(nix_pid, Signal::SIGTERM);
            if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
                return;
            }
        }
    }

    let _ = child.kill().await;
}
