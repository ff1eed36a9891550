//! termbridge relay: bridges a browser terminal on a WebSocket to a process
//! stream run by a [`StreamingExecutor`](termbridge_common::StreamingExecutor).
//!
//! Inbound JSON envelopes become console input and resize events, process
//! output goes back as `stdout` envelopes. See [`protocol`] for the wire
//! format and [`session::RelaySession`] for the shutdown rules.

pub mod logging;
pub mod protocol;
pub mod server;
pub mod session;
pub mod terminal;

pub use protocol::{decode, encode, Envelope};
pub use server::RelayServer;
pub use session::{RelaySession, SessionState, WsDuplex, END_OF_TRANSMISSION};
pub use terminal::wait_for_terminal;
