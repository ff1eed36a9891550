//! Wire envelope exchanged with the browser terminal.
//!
//! Every message is a JSON object `{"op", "data"?, "rows"?, "cols"?}`.
//! `op` decides which of the other fields mean anything.

use serde::Deserialize;
use serde_json::{Map, Value};
use termbridge_common::{RelayError, TerminalSize};

pub const OP_STDIN: &str = "stdin";
pub const OP_STDOUT: &str = "stdout";
pub const OP_RESIZE: &str = "resize";

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Console input from the client.
    Stdin(String),
    /// Process output for the client.
    Stdout(String),
    /// New terminal geometry reported by the client.
    Resize(TerminalSize),
    /// Well-formed message with an `op` the relay does not know.
    Other(String),
}

impl Envelope {
    pub fn op(&self) -> &str {
        match self {
            Envelope::Stdin(_) => OP_STDIN,
            Envelope::Stdout(_) => OP_STDOUT,
            Envelope::Resize(_) => OP_RESIZE,
            Envelope::Other(op) => op,
        }
    }
}

/// Loose wire shape; `op` is interpreted after parsing.
#[derive(Deserialize)]
struct WireMessage {
    op: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    rows: Option<u16>,
    #[serde(default)]
    cols: Option<u16>,
}

/// Serialize an envelope. Empty `data` and zero `rows`/`cols` are omitted.
pub fn encode(envelope: &Envelope) -> String {
    let mut obj = Map::new();
    obj.insert("op".into(), Value::from(envelope.op()));
    match envelope {
        Envelope::Stdin(data) | Envelope::Stdout(data) if !data.is_empty() => {
            obj.insert("data".into(), Value::from(data.as_str()));
        }
        Envelope::Resize(size) => {
            if size.rows != 0 {
                obj.insert("rows".into(), Value::from(size.rows));
            }
            if size.cols != 0 {
                obj.insert("cols".into(), Value::from(size.cols));
            }
        }
        _ => {}
    }
    Value::Object(obj).to_string()
}

/// Parse one inbound message.
pub fn decode(bytes: &[u8]) -> Result<Envelope, RelayError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| RelayError::MalformedMessage(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(RelayError::MalformedMessage(
            "message is not a JSON object".into(),
        ));
    }
    let wire: WireMessage = serde_json::from_value(value)
        .map_err(|e| RelayError::MalformedMessage(e.to_string()))?;

    match wire.op.as_str() {
        OP_STDIN => Ok(Envelope::Stdin(wire.data.unwrap_or_default())),
        OP_STDOUT => Ok(Envelope::Stdout(wire.data.unwrap_or_default())),
        OP_RESIZE => Ok(Envelope::Resize(TerminalSize::new(
            wire.rows.unwrap_or(0),
            wire.cols.unwrap_or(0),
        ))),
        _ => Ok(Envelope::Other(wire.op)),
    }
}
