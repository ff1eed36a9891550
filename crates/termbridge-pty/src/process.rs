//! A spawned process attached to a pseudo-terminal.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;

use portable_pty::{native_pty_system, Child, MasterPty, PtySize};
use termbridge_common::{ExecError, ExecRequest, TerminalSize};
use tokio::sync::mpsc;

use crate::env::build_command;

/// Maximum bytes read from the PTY in one go (8 KB).
pub const PTY_READ_CHUNK: usize = 8_192;

/// Output chunks buffered between the reader thread and the async pump.
const OUTPUT_QUEUE_DEPTH: usize = 64;

/// Input chunks buffered ahead of the writer thread. Once full, the input
/// pump stops reading the console until the process catches up.
pub const INPUT_QUEUE_DEPTH: usize = 16;

pub(crate) type SharedMaster = Arc<Mutex<Box<dyn MasterPty + Send>>>;

/// Owns the master side of a PTY pair and the child running on it.
///
/// Output is read on a `pty-reader` thread and delivered over
/// [`PtyProcess::output_rx`]; input is written on a `pty-writer` thread fed
/// by the bounded [`PtyProcess::input_tx`]. Both threads exit on their own
/// once the child is gone and the channels are dropped.
pub struct PtyProcess {
    pub(crate) master: SharedMaster,
    pub(crate) child: Box<dyn Child + Send + Sync>,
    pub(crate) input_tx: mpsc::Sender<Vec<u8>>,
    pub(crate) output_rx: mpsc::Receiver<Vec<u8>>,
}

impl PtyProcess {
    /// Open a PTY at the request's initial size and spawn its command.
    pub fn spawn(request: &ExecRequest) -> Result<Self, ExecError> {
        let cmd = build_command(request)?;
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(pty_size(request.initial_size))
            .map_err(|e| ExecError::Start(format!("failed to open PTY: {e}")))?;

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            ExecError::Start(format!(
                "failed to spawn {:?}: {e}",
                request.program().unwrap_or_default()
            ))
        })?;

        // Only the master side is needed from here on; keeping the slave open
        // would hold off EOF on the reader after the child exits.
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ExecError::Start(format!("failed to clone PTY reader: {e}")))?;

        let mut writer = pair
            .master
            .take_writer()
            .map_err(|e| ExecError::Start(format!("failed to take PTY writer: {e}")))?;

        let (output_tx, output_rx) = mpsc::channel::<Vec<u8>>(OUTPUT_QUEUE_DEPTH);
        thread::Builder::new()
            .name("pty-reader".into())
            .spawn(move || {
                let mut buf = [0u8; PTY_READ_CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break, // EOF, child exited
                        Ok(n) => {
                            if output_tx.blocking_send(buf[..n].to_vec()).is_err() {
                                break; // Receiver dropped
                            }
                        }
                        Err(e) => {
                            tracing::debug!("PTY reader error: {e}");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| ExecError::Start(format!("failed to spawn PTY reader thread: {e}")))?;

        let (input_tx, mut input_rx) = mpsc::channel::<Vec<u8>>(INPUT_QUEUE_DEPTH);
        thread::Builder::new()
            .name("pty-writer".into())
            .spawn(move || {
                while let Some(chunk) = input_rx.blocking_recv() {
                    if let Err(e) = writer.write_all(&chunk).and_then(|()| writer.flush()) {
                        tracing::debug!("PTY writer error: {e}");
                        break;
                    }
                }
            })
            .map_err(|e| ExecError::Start(format!("failed to spawn PTY writer thread: {e}")))?;

        Ok(Self {
            master: Arc::new(Mutex::new(pair.master)),
            child,
            input_tx,
            output_rx,
        })
    }

    /// OS process id of the child, when the platform exposes one.
    pub fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }
}

/// Inform the kernel (and thus the child) that the terminal size changed.
pub(crate) fn resize(master: &SharedMaster, size: TerminalSize) -> Result<(), ExecError> {
    let master = master
        .lock()
        .map_err(|_| ExecError::Stream("PTY master lock poisoned".into()))?;
    master
        .resize(pty_size(size))
        .map_err(|e| ExecError::Stream(format!("PTY resize failed: {e}")))
}

fn pty_size(size: TerminalSize) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}
