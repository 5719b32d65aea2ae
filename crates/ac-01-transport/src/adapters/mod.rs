//! Connector implementations.
//!
//! - [`WsConnector`]: WebSocket client over tokio-tungstenite
//! - [`MemoryConnector`]: scripted in-process links for tests and replays

pub mod memory;
pub mod websocket;

pub use memory::{MemoryConnector, MemoryLink};
pub use websocket::WsConnector;
