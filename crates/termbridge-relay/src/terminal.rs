//! Entry point tying a connection to one process stream.

use std::sync::Arc;

use termbridge_common::{
    ExecError, ExecRequest, ExitStatus, RelayError, StreamOptions, StreamingExecutor,
};
use tracing::{info, warn};

use crate::session::{RelaySession, WsDuplex};

/// Run `request` through `executor` with `conn` as its console.
///
/// Returns once the process stream ends. A stream that cannot be started is
/// reported to the client as a plain text frame and returned as
/// [`RelayError::ExecutorStart`].
pub async fn wait_for_terminal<S: WsDuplex>(
    conn: S,
    executor: &dyn StreamingExecutor,
    request: &ExecRequest,
) -> Result<ExitStatus, RelayError> {
    let session = Arc::new(RelaySession::new(conn));
    let options = StreamOptions::combined(session.clone(), request.tty);

    info!(
        target_name = %request.target.name,
        command = ?request.command,
        "starting terminal"
    );
    let result = executor.stream(request, options).await;

    let outcome = match result {
        Ok(status) => {
            if let Some(cause) = session.failure() {
                info!(code = status.code, cause = %cause, "terminal ended after client went away");
            } else {
                info!(code = status.code, "terminal ended");
            }
            Ok(status)
        }
        Err(ExecError::Start(reason)) => {
            warn!(%reason, "failed to start terminal");
            let toast = format!("failed to start terminal on {}: {reason}", request.target.name);
            if let Err(e) = session.notify(&toast).await {
                warn!(error = %e, "could not report start failure to client");
            }
            Err(RelayError::ExecutorStart(reason))
        }
        Err(e) => Err(e.into()),
    };

    session.finish().await;
    outcome
}
