//! # ac-01-transport
//!
//! Transport subsystem: owns the single real-time connection that feeds one
//! engine instance.
//!
//! ## Architecture
//!
//! ```text
//! Connector::dial() ──→ FrameSource ──text──→ WireEvent::decode ──→ SubscriberRegistry::dispatch
//!        ↑                    │
//!        │               closed/error
//!        └── n × base_delay ──┘   (until max_attempts, then GivenUp)
//! ```
//!
//! - [`TransportAdapter::connect`] returns immediately; dialing, reading and
//!   reconnecting run on a spawned task whose progress is observable through
//!   [`TransportAdapter::subscribe_state`].
//! - [`TransportAdapter::close`] clears the "still wanted" flag and cancels
//!   the task, including a pending backoff wait.
//! - The attempt counter resets only after a dial succeeds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let registry = Arc::new(SubscriberRegistry::new());
//! let transport = TransportAdapter::new(
//!     WsConnector::new("ws://localhost:3000/ws"),
//!     Arc::clone(&registry),
//!     ReconnectConfig::default(),
//! );
//! transport.connect()?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{MemoryConnector, MemoryLink, WsConnector};
pub use config::ReconnectConfig;
pub use error::{TransportError, TransportResult};
pub use ports::{Connector, FrameSource};
pub use service::{TransportAdapter, TransportStats};
