//! Driven ports (Outbound dependencies)
//!
//! The adapter only needs something that can be dialed and then yields text
//! frames until it closes.

use crate::error::TransportResult;
use async_trait::async_trait;

/// Opens one duplex connection.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Dial the remote end. Success means the connection is open.
    async fn dial(&self) -> TransportResult<Box<dyn FrameSource>>;

    /// Human-readable endpoint for logs.
    fn endpoint(&self) -> String;
}

/// Inbound half of an open connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Next text frame.
    ///
    /// `None` means the peer closed the connection; `Some(Err(_))` means the
    /// connection failed. Either ends this connection.
    async fn next_frame(&mut self) -> Option<TransportResult<String>>;
}
