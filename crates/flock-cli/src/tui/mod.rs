//! Terminal user interface for flock.
//!
//! Full-screen timeline browsing backed by the sync engine: incremental
//! refresh, gap filling, content-warning reveal, and a conversation
//! thread view.
//!
//! ## Entry points
//!
//! - [`timeline::run_timeline_tui`] — the interactive timeline.

pub mod thread;
pub mod timeline;
