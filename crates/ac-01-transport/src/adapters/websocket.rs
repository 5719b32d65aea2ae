//! WebSocket connector.

use crate::error::{TransportError, TransportResult};
use crate::ports::{Connector, FrameSource};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials a `ws://` or `wss://` endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn dial(&self) -> TransportResult<Box<dyn FrameSource>> {
        let (stream, _response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Dial {
                    endpoint: self.url.clone(),
                    reason: e.to_string(),
                })?;

        debug!(url = %self.url, "WebSocket handshake complete");
        Ok(Box::new(WsFrameSource { stream }))
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

struct WsFrameSource {
    stream: WsStream,
}

#[async_trait]
impl FrameSource for WsFrameSource {
    async fn next_frame(&mut self) -> Option<TransportResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    if let Some(text) = binary_text(&bytes) {
                        return Some(Ok(text));
                    }
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        return Some(Err(TransportError::Stream(e.to_string())));
                    }
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TransportError::Stream(e.to_string()))),
            }
        }
    }
}

/// Text carried in a binary frame; non-UTF-8 payloads are dropped as
/// malformed.
fn binary_text(bytes: &[u8]) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_owned()),
        Err(e) => {
            warn!(len = bytes.len(), error = %e, "Dropping malformed binary frame");
            None
        }
    }
}
