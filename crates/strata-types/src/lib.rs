//! Foundation types for strata, the dependency-ordered migration ledger.
//!
//! Every other strata crate depends on `strata-types`.
//!
//! # Key Types
//!
//! - [`EntryId`]: Globally unique migration identifier carrying a numeric ordering hint
//! - [`TagName`]: Name of a fact produced by exactly one entry
//! - [`EntryKind`]: Script, Asset, or Remove
//! - [`Entry`]: One immutable unit of change, built through [`EntryBuilder`]
//! - [`Payload`]: JSON-like structured value attached to an emitted tag

pub mod entry;
pub mod error;
pub mod id;
pub mod tag;

pub use entry::{Entry, EntryBuilder, EntryKind};
pub use error::TypeError;
pub use id::EntryId;
pub use tag::{Payload, TagName};
