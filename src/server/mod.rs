//! TCP transport: newline-delimited JSON requests in, one JSON response line
//! out per request.
//!
//! Each connection gets its own task. Store access is blocking (sled), so
//! every request is dispatched through `spawn_blocking`; the per-user locks
//! inside [`PetService`] keep concurrent connections for the same user from
//! interleaving.

pub mod protocol;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::pet::PetError;
use crate::service::PetService;

pub use protocol::{handle_line, handle_request, Op, Request, Response, Status};

pub struct PetServer {
    service: Arc<PetService>,
    bind: String,
    max_line_bytes: usize,
}

impl PetServer {
    pub fn new(service: Arc<PetService>, config: &ServerConfig) -> Self {
        Self {
            service,
            bind: config.bind.clone(),
            max_line_bytes: config.max_line_bytes,
        }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", self.bind, e))?;
        info!("petsim listening on {}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!("connection from {}", peer);
                            let service = self.service.clone();
                            let max_line_bytes = self.max_line_bytes;
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(service, stream, max_line_bytes).await {
                                    warn!("connection {} ended with error: {}", peer, e);
                                }
                                debug!("connection from {} closed", peer);
                            });
                        }
                        Err(e) => warn!("accept failed: {}", e),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Serve one client until it disconnects or sends an oversized line.
pub async fn handle_connection<S>(
    service: Arc<PetService>,
    stream: S,
    max_line_bytes: usize,
) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let limit = max_line_bytes as u64 + 1;
        let n = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        if buf.last() != Some(&b'\n') && buf.len() > max_line_bytes {
            warn!("request line over {} bytes, closing connection", max_line_bytes);
            let response = Response::bad_request("Request line too long");
            write_half.write_all(response.to_line().as_bytes()).await?;
            write_half.flush().await?;
            break;
        }

        let line = String::from_utf8_lossy(&buf).trim().to_string();
        if line.is_empty() {
            continue;
        }

        let svc = service.clone();
        let response = match tokio::task::spawn_blocking(move || handle_line(&svc, &line)).await {
            Ok(response) => response,
            Err(e) => {
                error!("request task failed: {}", e);
                Response::from_error(&PetError::Internal(e.to_string()))
            }
        };
        write_half.write_all(response.to_line().as_bytes()).await?;
        write_half.flush().await?;
    }

    Ok(())
}
