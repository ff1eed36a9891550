//! [`StreamingExecutor`] implementation that runs commands in a local PTY.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portable_pty::ChildKiller;
use termbridge_common::{
    ConsoleInput, ConsoleOutput, ExecError, ExecRequest, ExitStatus, RelayError, StreamOptions,
    StreamingExecutor, TerminalSizeQueue,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::process::{self, PtyProcess, SharedMaster};

/// How long a process may outlive its console input before it is killed.
const DEFAULT_EXIT_GRACE: Duration = Duration::from_secs(5);

/// How long to keep forwarding output after the process has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Runs each request as a child process on a fresh local PTY.
///
/// The process ends the stream: its exit status is returned once it exits.
/// When console input closes (the client went away or sent garbage) the
/// process gets [`LocalPtyExecutor::with_exit_grace`] to exit on its own
/// before it is killed; when console output fails it is killed at once.
#[derive(Debug, Clone)]
pub struct LocalPtyExecutor {
    exit_grace: Duration,
}

impl Default for LocalPtyExecutor {
    fn default() -> Self {
        Self {
            exit_grace: DEFAULT_EXIT_GRACE,
        }
    }
}

impl LocalPtyExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exit_grace(mut self, grace: Duration) -> Self {
        self.exit_grace = grace;
        self
    }
}

/// Which pump finished, and how.
enum PumpExit {
    Input(Result<(), RelayError>),
    Output(Result<(), RelayError>),
    Resize,
}

/// Kills the child if the stream is abandoned before the child was reaped.
struct KillOnDrop {
    killer: Box<dyn ChildKiller + Send + Sync>,
    armed: bool,
}

impl KillOnDrop {
    fn kill(&mut self) {
        if let Err(e) = self.killer.kill() {
            debug!("PTY kill error (may already be dead): {e}");
        }
    }
}

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.kill();
        }
    }
}

#[async_trait]
impl StreamingExecutor for LocalPtyExecutor {
    async fn stream(
        &self,
        request: &ExecRequest,
        options: StreamOptions,
    ) -> Result<ExitStatus, ExecError> {
        let process = PtyProcess::spawn(request)?;
        info!(
            target_name = %request.target.name,
            command = ?request.command,
            pid = ?process.pid(),
            size = %request.initial_size,
            "process started"
        );

        let PtyProcess {
            master,
            mut child,
            input_tx,
            output_rx,
        } = process;

        let mut guard = KillOnDrop {
            killer: child.clone_killer(),
            armed: true,
        };
        let mut wait = tokio::task::spawn_blocking(move || child.wait());

        // stderr is unused: the PTY merges it into stdout.
        let StreamOptions {
            stdin,
            stdout,
            resize,
            ..
        } = options;

        // Dropping the set aborts whatever pumps are still running.
        let mut pumps = JoinSet::new();
        pumps.spawn(async move { PumpExit::Output(pump_output(output_rx, stdout).await) });
        pumps.spawn(async move { PumpExit::Input(pump_input(stdin, input_tx).await) });
        pumps.spawn(async move {
            pump_resize(resize, master).await;
            PumpExit::Resize
        });

        let mut output_done = false;
        let mut kill_deadline: Option<Instant> = None;

        let waited = loop {
            tokio::select! {
                waited = &mut wait => break waited,

                Some(joined) = pumps.join_next() => match joined {
                    Ok(PumpExit::Input(Err(e))) => {
                        debug!(error = %e, "console input closed");
                        kill_deadline = Some(Instant::now() + self.exit_grace);
                    }
                    Ok(PumpExit::Output(result)) => {
                        output_done = true;
                        if let Err(e) = result {
                            warn!(error = %e, "console output failed, killing process");
                            guard.kill();
                        }
                    }
                    Ok(PumpExit::Input(Ok(())) | PumpExit::Resize) => {}
                    Err(e) => warn!(error = %e, "pump task failed"),
                },

                () = grace_elapsed(kill_deadline) => {
                    warn!(
                        grace = ?self.exit_grace,
                        "process still running after console input closed, killing"
                    );
                    guard.kill();
                    kill_deadline = None;
                }
            }
        };
        guard.armed = false;

        if !output_done {
            let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
                while let Some(joined) = pumps.join_next().await {
                    if let Ok(PumpExit::Output(result)) = joined {
                        return result;
                    }
                }
                Ok(())
            })
            .await;
            match drained {
                Ok(Err(e)) => debug!(error = %e, "output lost after exit"),
                Err(_) => debug!("output drain timed out"),
                Ok(Ok(())) => {}
            }
        }

        let status = waited
            .map_err(|e| ExecError::Stream(format!("wait task failed: {e}")))?
            .map_err(|e| ExecError::Stream(format!("failed to wait for process: {e}")))?;
        let status = ExitStatus {
            code: status.exit_code(),
        };
        info!(code = status.code, "process exited");
        Ok(status)
    }
}

/// Forward PTY output to the console until EOF or a write failure.
async fn pump_output(
    mut output_rx: mpsc::Receiver<Vec<u8>>,
    stdout: Option<Arc<dyn ConsoleOutput>>,
) -> Result<(), RelayError> {
    while let Some(chunk) = output_rx.recv().await {
        if let Some(stdout) = &stdout {
            stdout.write_output(&chunk).await?;
        }
    }
    Ok(())
}

/// Forward console input to the PTY writer until the input side fails.
///
/// The console is only read again once the writer queue has room, so a
/// process that stops reading stdin stalls the client instead of piling up
/// input. Bytes left in the buffer by a failing read (the end-of-transmission
/// byte) are still delivered before the error is returned.
async fn pump_input(
    stdin: Option<Arc<dyn ConsoleInput>>,
    input_tx: mpsc::Sender<Vec<u8>>,
) -> Result<(), RelayError> {
    let Some(stdin) = stdin else {
        return Ok(());
    };
    let mut buf = Vec::new();
    loop {
        let result = stdin.read_input(&mut buf).await;
        if !buf.is_empty() && input_tx.send(std::mem::take(&mut buf)).await.is_err() {
            return Err(RelayError::Executor("PTY input closed".into()));
        }
        result?;
    }
}

async fn pump_resize(resize: Option<Arc<dyn TerminalSizeQueue>>, master: SharedMaster) {
    let Some(resize) = resize else {
        return;
    };
    while let Some(size) = resize.next_terminal_size().await {
        match process::resize(&master, size) {
            Ok(()) => debug!(%size, "PTY resized"),
            Err(e) => warn!(error = %e, "failed to resize PTY"),
        }
    }
}

async fn grace_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::INPUT_QUEUE_DEPTH;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use termbridge_common::{ExecTarget, TerminalSize};

    /// Hands out scripted chunks, then fails like a dropped connection.
    struct ScriptedInput {
        chunks: Mutex<VecDeque<&'static [u8]>>,
    }

    impl ScriptedInput {
        fn new(chunks: &[&'static [u8]]) -> Arc<Self> {
            Arc::new(Self {
                chunks: Mutex::new(chunks.iter().copied().collect()),
            })
        }
    }

    #[async_trait]
    impl ConsoleInput for ScriptedInput {
        async fn read_input(&self, buf: &mut Vec<u8>) -> Result<usize, RelayError> {
            let next = self.chunks.lock().unwrap().pop_front();
            match next {
                Some(chunk) => {
                    buf.extend_from_slice(chunk);
                    Ok(chunk.len())
                }
                None => {
                    buf.push(0x04);
                    Err(RelayError::Transport("connection closed".into()))
                }
            }
        }
    }

    /// Never produces input.
    struct IdleInput;

    #[async_trait]
    impl ConsoleInput for IdleInput {
        async fn read_input(&self, _buf: &mut Vec<u8>) -> Result<usize, RelayError> {
            std::future::pending().await
        }
    }

    /// Always has another 64 KiB ready, like a client pasting without end.
    #[derive(Default)]
    struct FloodingInput {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl ConsoleInput for FloodingInput {
        async fn read_input(&self, buf: &mut Vec<u8>) -> Result<usize, RelayError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            buf.resize(buf.len() + 64 * 1024, b'x');
            Ok(64 * 1024)
        }
    }

    #[derive(Default)]
    struct CollectingOutput {
        data: Mutex<Vec<u8>>,
    }

    impl CollectingOutput {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.data.lock().unwrap()).into_owned()
        }
    }

    #[async_trait]
    impl ConsoleOutput for CollectingOutput {
        async fn write_output(&self, data: &[u8]) -> Result<usize, RelayError> {
            self.data.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
    }

    struct BrokenOutput;

    #[async_trait]
    impl ConsoleOutput for BrokenOutput {
        async fn write_output(&self, _data: &[u8]) -> Result<usize, RelayError> {
            Err(RelayError::Transport("broken pipe".into()))
        }
    }

    struct OneResize {
        size: Mutex<Option<TerminalSize>>,
    }

    #[async_trait]
    impl TerminalSizeQueue for OneResize {
        async fn next_terminal_size(&self) -> Option<TerminalSize> {
            let next = self.size.lock().unwrap().take();
            match next {
                Some(size) => Some(size),
                None => std::future::pending().await,
            }
        }
    }

    fn request(command: &[&str]) -> ExecRequest {
        ExecRequest::new(
            ExecTarget {
                name: "test".into(),
                ..ExecTarget::default()
            },
            command.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn shell_runs_input_and_exits_on_end_of_transmission() {
        let output = Arc::new(CollectingOutput::default());
        let options = StreamOptions {
            stdin: Some(ScriptedInput::new(&[b"echo RELAY_MARKER_42\n"])),
            stdout: Some(output.clone()),
            tty: true,
            ..StreamOptions::default()
        };

        let status = tokio::time::timeout(
            Duration::from_secs(10),
            LocalPtyExecutor::new().stream(&request(&["/bin/sh"]), options),
        )
        .await
        .expect("shell should exit on EOT")
        .expect("stream");

        assert!(status.success(), "exit status: {status:?}");
        assert!(
            output.text().contains("RELAY_MARKER_42"),
            "output: {:?}",
            output.text()
        );
    }

    #[tokio::test]
    async fn process_ignoring_eot_is_killed_after_grace() {
        let options = StreamOptions {
            stdin: Some(ScriptedInput::new(&[])),
            stdout: Some(Arc::new(CollectingOutput::default())),
            tty: true,
            ..StreamOptions::default()
        };
        let executor = LocalPtyExecutor::new().with_exit_grace(Duration::from_millis(200));

        let status = tokio::time::timeout(
            Duration::from_secs(10),
            executor.stream(&request(&["sleep", "30"]), options),
        )
        .await
        .expect("process should be killed")
        .expect("stream");

        assert!(!status.success());
    }

    #[tokio::test]
    async fn failing_output_kills_process() {
        let options = StreamOptions {
            stdin: Some(Arc::new(IdleInput)),
            stdout: Some(Arc::new(BrokenOutput)),
            tty: true,
            ..StreamOptions::default()
        };

        let status = tokio::time::timeout(
            Duration::from_secs(10),
            LocalPtyExecutor::new().stream(
                &request(&["sh", "-c", "while true; do echo tick; sleep 0.1; done"]),
                options,
            ),
        )
        .await
        .expect("process should be killed")
        .expect("stream");

        assert!(!status.success());
    }

    #[tokio::test]
    async fn resize_is_applied_to_the_pty() {
        let output = Arc::new(CollectingOutput::default());
        let options = StreamOptions {
            stdin: Some(Arc::new(IdleInput)),
            stdout: Some(output.clone()),
            resize: Some(Arc::new(OneResize {
                size: Mutex::new(Some(TerminalSize::new(40, 120))),
            })),
            tty: true,
            ..StreamOptions::default()
        };

        let status = tokio::time::timeout(
            Duration::from_secs(10),
            LocalPtyExecutor::new()
                .stream(&request(&["sh", "-c", "sleep 0.5; stty size"]), options),
        )
        .await
        .expect("stty should finish")
        .expect("stream");

        assert!(status.success());
        assert!(output.text().contains("40 120"), "output: {:?}", output.text());
    }

    #[tokio::test]
    async fn input_stalls_when_writer_stops_draining() {
        let input = Arc::new(FloodingInput::default());
        // Nothing ever receives, as when the process stops reading stdin.
        let (input_tx, _input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);

        let pump = pump_input(Some(input.clone()), input_tx);
        let outcome = tokio::time::timeout(Duration::from_millis(200), pump).await;
        assert!(outcome.is_err(), "pump should be parked on the full queue");

        // One read per queue slot, plus the chunk waiting for a slot.
        assert_eq!(input.reads.load(Ordering::SeqCst), INPUT_QUEUE_DEPTH + 1);
    }

    #[tokio::test]
    async fn unknown_program_is_a_start_error() {
        let err = LocalPtyExecutor::new()
            .stream(&request(&["/no/such/program"]), StreamOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Start(_)));
    }
}
