//! # Shared Bus - Event Fan-Out for the Consensus Engine
//!
//! Maps event tags to handler sets and delivers decoded frames to them.
//!
//! ```text
//! ┌──────────────┐   dispatch()   ┌──────────────────────┐
//! │  Transport   │ ─────────────→ │ SubscriberRegistry   │
//! └──────────────┘                │  AGENT_VOTE    → {h} │──→ engine vote path
//!                                 │  BLOCK_VERDICT → {h} │──→ engine verdict path
//!                                 └──────────────────────┘
//! ```
//!
//! ## Delivery Rules
//!
//! - **Snapshot dispatch:** the handler set is copied before delivery, so
//!   handlers added or removed mid-dispatch only affect later dispatches.
//! - **Explicit identity:** handlers carry a [`HandlerId`]; subscribing the
//!   same handler twice is a no-op and unsubscribe matches by id.
//! - **Isolation:** an error or panic in one handler is logged and counted,
//!   and delivery continues with the next handler.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod handler;
pub mod listeners;
pub mod registry;

// Re-export main types
pub use handler::{Handler, HandlerError, HandlerId};
pub use listeners::{ListenerId, ListenerSet};
pub use registry::{DispatchReport, SubscriberRegistry};
