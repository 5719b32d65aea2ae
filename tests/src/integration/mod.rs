//! # Integration Flows
//!
//! Every flow drives a real `ConsensusEngine` through a `MemoryConnector`, so
//! frames travel the same decode → registry → engine path as production
//! WebSocket traffic.

pub mod reconnect;
pub mod thread_session;
