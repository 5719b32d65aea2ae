//! # Agent Council Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── pipeline_benchmarks.rs   # dedup → tally → evaluate throughput
//! └── src/
//!     └── integration/             # Full pipeline over the in-memory transport
//!         ├── thread_session.rs
//!         ├── reconnect.rs
//!         └── config_loading.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ac-tests
//!
//! # By flow
//! cargo test -p ac-tests integration::reconnect::
//!
//! # Benchmarks
//! cargo bench -p ac-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
