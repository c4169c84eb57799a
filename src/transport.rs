//! Single-shot JSON transport over process stdio
//!
//! The exporter reads exactly one request from its input, answers with
//! exactly one response and exits. Exit code 0 means success, 1 means any
//! failure, malformed input included.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{ExportError, Result};
use crate::export::Exporter;
use crate::protocol::{Request, Response, ResponseData};

/// Exporter side: read one request and produce its response
pub async fn serve<R>(mut input: R, exporter: &mut Exporter<'_>) -> Response
where
    R: AsyncRead + Unpin,
{
    let mut raw = String::new();
    let result = match input.read_to_string(&mut raw).await {
        Ok(len) => {
            debug!(bytes = len, "request received");
            match Request::parse(&raw) {
                Ok(request) => exporter.export(request).await,
                Err(err) => Err(err),
            }
        }
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(data) => Response::success(data),
        Err(err) => {
            error!("export failed: {err}");
            Response::failure(&err)
        }
    }
}

/// Process exit code for a response
pub fn exit_code(response: &Response) -> i32 {
    if response.success {
        0
    } else {
        1
    }
}

/// Editor side: run the exporter program on one request
///
/// The whole exchange (spawn, write, close, read) runs under `timeout`;
/// the child is killed if the deadline passes.
pub async fn invoke(
    program: &Path,
    args: &[String],
    request: &Request,
    timeout: Duration,
) -> Result<ResponseData> {
    let payload = serde_json::to_vec(request)?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExportError::renderer(format!("cannot start {}: {e}", program.display())))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ExportError::renderer("exporter stdin unavailable"))?;

    let exchange = async move {
        match stdin.write_all(&payload).await {
            // The exporter may answer without reading everything.
            Err(err) if err.kind() != ErrorKind::BrokenPipe => return Err(err),
            _ => {}
        }
        drop(stdin);
        child.wait_with_output().await
    };

    let output = match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result?,
        Err(_) => return Err(ExportError::RenderTimeout(timeout)),
    };
    debug!(status = %output.status, bytes = output.stdout.len(), "exporter finished");

    let response: Response = serde_json::from_slice(&output.stdout).map_err(|e| {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        ExportError::Renderer {
            message: format!("exporter did not answer with JSON ({}): {e}", output.status),
            stderr: (!stderr.is_empty()).then_some(stderr),
        }
    })?;
    response.into_result()
}
