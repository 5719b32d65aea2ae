//! # Council Watch
//!
//! Runtime pieces of the `council-watch` binary, kept in a library so they
//! can be exercised without a terminal.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags ([`cli::Args`])
//! 2. Install the tracing subscriber ([`logging::init_tracing`])
//! 3. Resolve configuration: file, then environment, then flags
//! 4. Build the engine over a WebSocket connector and attach log observers
//! 5. Run until Ctrl+C or until the transport gives up ([`watcher::run_until`])

pub mod cli;
pub mod logging;
pub mod watcher;

pub use cli::Args;
pub use watcher::{attach_log_observers, run_until, WatchExit, WatchSummary};
