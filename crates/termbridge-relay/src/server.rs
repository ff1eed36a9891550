//! WebSocket front door: accepts TCP connections, upgrades the configured
//! path, and runs one terminal per connection.

use std::net::SocketAddr;
use std::sync::Arc;

use termbridge_common::{ExecRequest, SessionId, StreamingExecutor, TermbridgeError};
use termbridge_config::TermbridgeConfig;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{accept_hdr_async_with_config, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::terminal::wait_for_terminal;

/// What every connection shares.
struct Shared {
    path: String,
    max_message_bytes: usize,
    request: ExecRequest,
    executor: Arc<dyn StreamingExecutor>,
}

/// Listens for browser terminals and serves each one on its own task.
pub struct RelayServer {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl RelayServer {
    /// Bind the configured listen address.
    pub async fn bind(
        config: &TermbridgeConfig,
        executor: Arc<dyn StreamingExecutor>,
    ) -> Result<Self, TermbridgeError> {
        let listener = TcpListener::bind(&config.server.listen).await?;
        Ok(Self {
            listener,
            shared: Arc::new(Shared {
                path: config.server.path.clone(),
                max_message_bytes: config.server.max_message_bytes,
                request: config.exec_request(),
                executor,
            }),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Sessions already running are left to finish on their own tasks.
    pub async fn serve(self, shutdown: CancellationToken) {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, path = %self.shared.path, "termbridge listening");
        }

        loop {
            let accepted = tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    let id = SessionId::new();
                    let span = tracing::info_span!("session", session = %id.short(), %peer);
                    tokio::spawn(handle_connection(stream, self.shared.clone()).instrument(span));
                }
                Err(e) => {
                    warn!(error = %e, "TCP accept error");
                }
            }
        }
        info!("termbridge stopped accepting connections");
    }
}

async fn handle_connection(stream: TcpStream, shared: Arc<Shared>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }

    let ws = match accept_websocket(stream, &shared).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake failed");
            return;
        }
    };
    info!("client connected");

    match wait_for_terminal(ws, shared.executor.as_ref(), &shared.request).await {
        Ok(status) => info!(code = status.code, "client disconnected"),
        Err(e) => warn!(error = %e, "terminal session failed"),
    }
}

async fn accept_websocket(
    stream: TcpStream,
    shared: &Shared,
) -> Result<WebSocketStream<TcpStream>, tokio_tungstenite::tungstenite::Error> {
    let path = shared.path.clone();
    let callback = move |request: &Request, response: Response| {
        if request.uri().path() == path {
            Ok(response)
        } else {
            debug!(path = %request.uri().path(), "rejecting upgrade for unknown path");
            Err(not_found())
        }
    };

    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(shared.max_message_bytes);
    ws_config.max_frame_size = Some(shared.max_message_bytes);

    accept_hdr_async_with_config(stream, callback, Some(ws_config)).await
}

fn not_found() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("not found".to_string()));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}
