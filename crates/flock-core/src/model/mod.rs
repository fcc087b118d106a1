//! Data model for the rendering engine: stable item identities, the
//! reference-shared per-item attribute records, and the renderable item
//! variants emitted by the reconciler.

pub mod attribute;
pub mod id;
pub mod item;
pub mod status;

pub use attribute::{Attribute, AttributeStore, ExpansionState, RevealState, SharedAttribute};
pub use id::StatusId;
pub use item::{EmptyReason, RenderItem};
pub use status::Status;
