//! TCP transport: framing, dial-call-close client, accept-loop server.
//!
//! Connections are ephemeral. A call dials the peer, writes one framed
//! request, reads one framed response, and drops the socket; the server
//! accepts, serves one request per connection in its own task, and lets the
//! socket close. No pooling, no keep-alive.
//!
//! ## Wire format
//!
//! Each direction carries exactly one frame: `[length: u32 LE][cbor bytes]`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::cbor;
use crate::messages::{RpcRequest, RpcResponse};
use crate::{Result, TransportError};

/// Maximum frame size (to prevent allocation attacks).
pub const MAX_FRAME_SIZE: usize = 65536;

/// Handler for inbound RPC requests.
///
/// Implementors produce a response for every request; transport-level
/// failures never originate here. The abstraction keeps the listener free of
/// node state and lets tests drive it with a stub.
pub trait RpcHandler: Send + Sync + 'static {
    /// Handle a single inbound request and produce its response.
    fn handle(&self, request: RpcRequest) -> impl std::future::Future<Output = RpcResponse> + Send;
}

/// Write one length-prefixed frame.
///
/// # Errors
///
/// Returns [`TransportError::Io`] if the write fails, or
/// [`TransportError::ProtocolViolation`] if the frame exceeds
/// [`MAX_FRAME_SIZE`].
pub async fn send_frame(stream: &mut TcpStream, data: &[u8]) -> Result<()> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(TransportError::ProtocolViolation(format!(
            "frame too large: {} bytes, max {MAX_FRAME_SIZE}",
            data.len()
        )));
    }
    let len = data.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    stream
        .write_all(data)
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// # Errors
///
/// Returns [`TransportError::Io`] if the read fails, or
/// [`TransportError::ProtocolViolation`] if the announced length exceeds
/// [`MAX_FRAME_SIZE`].
pub async fn recv_frame(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(TransportError::ProtocolViolation(format!(
            "frame length {len} exceeds maximum {MAX_FRAME_SIZE}"
        )));
    }

    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(|e| TransportError::Io(e.to_string()))?;
    Ok(buf)
}

/// Perform one RPC against a remote peer: dial, send, receive, close.
///
/// The whole exchange is bounded by `deadline`; the echoed message id is
/// checked against the request's.
///
/// # Errors
///
/// Returns [`TransportError::Timeout`] when the deadline elapses,
/// [`TransportError::Connection`] when the peer cannot be dialed, and
/// [`TransportError::ProtocolViolation`] on a mismatched message id.
pub async fn call(
    addr: SocketAddr,
    request: &RpcRequest,
    deadline: Duration,
) -> Result<RpcResponse> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        send_frame(&mut stream, &cbor::to_vec(request)?).await?;
        let data = recv_frame(&mut stream).await?;
        cbor::from_slice::<RpcResponse>(&data)
    };

    let response = tokio::time::timeout(deadline, exchange)
        .await
        .map_err(|_| TransportError::Timeout)??;

    if response.msg_id() != request.msg_id() {
        return Err(TransportError::ProtocolViolation(format!(
            "message id mismatch: sent {}, got {}",
            request.msg_id(),
            response.msg_id()
        )));
    }

    Ok(response)
}

/// A bound RPC listener.
pub struct RpcListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RpcListener {
    /// Bind to the given address. Port 0 selects an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the socket cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        tracing::info!(%local_addr, "RPC listener bound");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections forever, serving each in its own task.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the accept loop fails.
    pub async fn serve<H: RpcHandler>(self, handler: Arc<H>) -> Result<()> {
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| TransportError::Io(e.to_string()))?;

            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, handler).await {
                    tracing::debug!(%peer, error = %e, "RPC connection failed");
                }
            });
        }
    }
}

/// Serve one request/response exchange on an accepted connection.
async fn serve_connection<H: RpcHandler>(mut stream: TcpStream, handler: Arc<H>) -> Result<()> {
    let data = recv_frame(&mut stream).await?;
    let request: RpcRequest = cbor::from_slice(&data)?;
    let response = handler.handle(request).await;
    send_frame(&mut stream, &cbor::to_vec(&response)?).await
}
