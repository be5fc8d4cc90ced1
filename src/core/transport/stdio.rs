//! STDIO transport implementation.
//!
//! Line-delimited JSON over standard input/output - the default mode. One
//! request is read, dispatched and answered before the next line is read, so
//! responses always come back in request order.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::TransportResult;
use super::connection::Connection;
use super::protocol::{JsonRpcResponse, process_line};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin closes or shutdown is requested.
    pub async fn run(server: McpServer, shutdown: CancellationToken) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");
        Self::serve(server, tokio::io::stdin(), tokio::io::stdout(), shutdown).await?;
        info!("STDIO transport finished");
        Ok(())
    }

    /// Serve the duplex protocol over an arbitrary reader/writer pair.
    ///
    /// Shutdown is only observed between requests: a request that has been
    /// read is always answered.
    pub async fn serve<R, W>(
        server: McpServer,
        reader: R,
        mut writer: W,
        shutdown: CancellationToken,
    ) -> TransportResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut conn = Connection::new("stdio");
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        conn.open();

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested, no longer reading stdin");
                    break;
                }
                read = reader.read_until(b'\n', &mut buf) => read?,
            };
            if read == 0 {
                debug!("stdin closed");
                break;
            }

            conn.begin();
            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => process_line(&server, line).await,
                Err(e) => {
                    warn!("Rejected request: {}", e);
                    Some(JsonRpcResponse::parse_error(format!("Parse error: {e}")))
                }
            };
            if let Some(response) = response {
                let mut encoded = serde_json::to_vec(&response)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
            conn.finish();
        }

        conn.drain();
        writer.flush().await?;
        conn.close();
        Ok(())
    }
}
