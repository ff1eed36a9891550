//! Relay session: one WebSocket connection seen as console input, console
//! output and a terminal size source.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use termbridge_common::{ConsoleInput, ConsoleOutput, RelayError, TerminalSize, TerminalSizeQueue};
use tokio::sync::{watch, Mutex};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::protocol::{self, Envelope};

/// Byte handed to the process when the connection goes away, so it sees
/// end of input instead of waiting forever.
pub const END_OF_TRANSMISSION: u8 = 0x04;

/// A message-framed WebSocket connection.
pub trait WsDuplex:
    Stream<Item = Result<Message, WsError>>
    + Sink<Message, Error = WsError>
    + Unpin
    + Send
    + 'static
{
}

impl<T> WsDuplex for T where
    T: Stream<Item = Result<Message, WsError>>
        + Sink<Message, Error = WsError>
        + Unpin
        + Send
        + 'static
{
}

/// Lifecycle of a session. It only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

struct Writer<S> {
    sink: SplitSink<S, Message>,
    /// Trailing bytes of an unfinished UTF-8 sequence from the last write.
    carry: Vec<u8>,
}

/// Bridges one duplex connection to a process stream.
///
/// The reading and writing halves sit behind their own locks so the
/// executor may drive input, output and resize from separate tasks.
/// Any read failure shuts the session down: the done token is cancelled,
/// pending size waiters are released, and the first failure is kept and
/// returned to every later reader.
pub struct RelaySession<S> {
    reader: Mutex<SplitStream<S>>,
    writer: Mutex<Writer<S>>,
    size_tx: watch::Sender<Option<TerminalSize>>,
    size_rx: Mutex<watch::Receiver<Option<TerminalSize>>>,
    done: CancellationToken,
    state: AtomicU8,
    failure: OnceLock<RelayError>,
}

impl<S: WsDuplex> RelaySession<S> {
    pub fn new(conn: S) -> Self {
        let (sink, stream) = conn.split();
        let (size_tx, size_rx) = watch::channel(None);
        Self {
            reader: Mutex::new(stream),
            writer: Mutex::new(Writer {
                sink,
                carry: Vec::new(),
            }),
            size_tx,
            size_rx: Mutex::new(size_rx),
            done: CancellationToken::new(),
            state: AtomicU8::new(OPEN),
            failure: OnceLock::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            OPEN => SessionState::Open,
            CLOSING => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Resolves once the session has shut down.
    pub async fn closed(&self) {
        self.done.cancelled().await;
    }

    /// The error that shut the session down, if it has.
    pub fn failure(&self) -> Option<RelayError> {
        self.failure.get().cloned()
    }

    /// Shut the session down locally. Idempotent.
    pub fn close(&self) {
        self.shut_down(RelayError::SessionClosed);
    }

    /// Send `text` as a raw text frame, outside the envelope.
    pub async fn notify(&self, text: &str) -> Result<(), RelayError> {
        let mut writer = self.writer.lock().await;
        writer
            .sink
            .send(Message::Text(text.to_owned().into()))
            .await
            .map_err(transport)
    }

    /// Send a close frame and flush. Best effort.
    pub async fn finish(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.sink.close().await {
            debug!(error = %e, "closing connection failed");
        }
    }

    /// Move to `Closing`, release waiters, then `Closed`. Only the first
    /// call records its cause; every call returns the recorded one.
    fn shut_down(&self, cause: RelayError) -> RelayError {
        if self
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!(cause = %cause, "relay session closing");
            let _ = self.failure.set(cause.clone());
            self.done.cancel();
            self.state.store(CLOSED, Ordering::Release);
            return cause;
        }
        self.failure.get().cloned().unwrap_or(cause)
    }

    fn terminal_error(&self) -> RelayError {
        self.failure().unwrap_or(RelayError::SessionClosed)
    }

    /// The connection itself failed: hand the process an EOT and shut down.
    fn transport_failed(&self, buf: &mut Vec<u8>, reason: String) -> RelayError {
        let already_closed = self.is_closed();
        let err = self.shut_down(RelayError::Transport(reason));
        if !already_closed {
            buf.push(END_OF_TRANSMISSION);
        }
        err
    }
}

#[async_trait]
impl<S: WsDuplex> ConsoleInput for RelaySession<S> {
    async fn read_input(&self, buf: &mut Vec<u8>) -> Result<usize, RelayError> {
        if self.is_closed() {
            return Err(self.terminal_error());
        }

        let frame = {
            let mut reader = self.reader.lock().await;
            tokio::select! {
                biased;
                () = self.done.cancelled() => return Err(self.terminal_error()),
                frame = reader.next() => frame,
            }
        };

        let decoded = match frame {
            Some(Ok(Message::Text(text))) => protocol::decode(text.as_bytes()),
            Some(Ok(Message::Binary(data))) => protocol::decode(&data),
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => return Ok(0),
            Some(Ok(Message::Close(frame))) => {
                let reason = match frame {
                    Some(frame) => format!("closed by peer ({})", frame.code),
                    None => "closed by peer".to_string(),
                };
                return Err(self.transport_failed(buf, reason));
            }
            Some(Err(e)) => return Err(self.transport_failed(buf, e.to_string())),
            None => return Err(self.transport_failed(buf, "connection closed".into())),
        };

        match decoded {
            Ok(Envelope::Stdin(data)) => {
                buf.extend_from_slice(data.as_bytes());
                Ok(data.len())
            }
            Ok(Envelope::Resize(size)) => {
                trace!(%size, "resize requested");
                self.size_tx.send_replace(Some(size));
                Ok(0)
            }
            Ok(other) => Err(self.shut_down(RelayError::UnknownOperation(other.op().to_string()))),
            Err(e) => Err(self.shut_down(e)),
        }
    }
}

#[async_trait]
impl<S: WsDuplex> ConsoleOutput for RelaySession<S> {
    async fn write_output(&self, data: &[u8]) -> Result<usize, RelayError> {
        if self.is_closed() {
            return Err(self.terminal_error());
        }

        let mut writer = self.writer.lock().await;
        let text = writer.take_text(data);
        if text.is_empty() {
            return Ok(data.len());
        }
        let frame = protocol::encode(&Envelope::Stdout(text));
        writer
            .sink
            .send(Message::Text(frame.into()))
            .await
            .map_err(transport)?;
        Ok(data.len())
    }
}

#[async_trait]
impl<S: WsDuplex> TerminalSizeQueue for RelaySession<S> {
    async fn next_terminal_size(&self) -> Option<TerminalSize> {
        let mut size_rx = self.size_rx.lock().await;
        loop {
            tokio::select! {
                biased;
                () = self.done.cancelled() => return None,
                changed = size_rx.changed() => {
                    changed.ok()?;
                    if let Some(size) = *size_rx.borrow_and_update() {
                        return Some(size);
                    }
                }
            }
        }
    }
}

impl<S> Writer<S> {
    /// Prepend carried bytes, hold back an unfinished trailing sequence, and
    /// decode the rest lossily.
    fn take_text(&mut self, data: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(data);
        let keep = incomplete_utf8_tail(&bytes);
        self.carry = bytes.split_off(bytes.len() - keep);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Length of a UTF-8 sequence cut off at the end of `bytes`, or 0.
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for i in (start..bytes.len()).rev() {
        let byte = bytes[i];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        let have = bytes.len() - i;
        return if have < needed { have } else { 0 };
    }
    0
}

fn transport(e: WsError) -> RelayError {
    RelayError::Transport(e.to_string())
}
