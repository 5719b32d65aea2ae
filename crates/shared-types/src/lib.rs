//! # Shared Types Crate
//!
//! This crate contains the domain entities and wire types shared by the
//! transport, tally, consensus and engine crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Vote`, `Verdict` and `ConnectionState` are
//!   defined once, here.
//! - **One Canonical Schema**: inbound JSON is decoded into [`WireEvent`] and
//!   [`WireVote`]; the normalization into [`Vote`] happens in [`wire`] and
//!   nowhere else.
//! - **Opaque Chain Identity**: [`ChainTag`] is carried through, never
//!   interpreted.

pub mod entities;
pub mod errors;
pub mod wire;

pub use entities::*;
pub use errors::*;
pub use wire::{decode_vote, EventTag, WireEvent, WireVote};
