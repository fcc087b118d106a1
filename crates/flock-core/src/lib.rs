//! flock-core library.
//!
//! Timeline synchronization and incremental rendering engine: pagination
//! and gap-fill state machines, the attribute-preserving snapshot
//! reconciler, and the conversation tree builder.
//!
//! # Conventions
//!
//! - **Errors**: library types use `thiserror`; fallible boundary calls
//!   return explicit `Result`s. Fetch failures never unwind through the
//!   reconciler — they become machine states.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`,
//!   `trace!`). Illegal state transitions are warn-logged no-ops.
//! - **Threading**: everything here runs on the single UI-owning thread.
//!   The only suspension point is the fetch boundary, expressed as
//!   [`fetch::FetchCommand`] / [`fetch::FetchOutcome`] values.

pub mod conversation;
pub mod error;
pub mod fetch;
pub mod gap;
pub mod model;
pub mod pagination;
pub mod reconcile;
pub mod store;
pub mod timeline;
