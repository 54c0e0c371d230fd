//! Foundation types for Arbor.
//!
//! This crate provides the persistent value tree that every other Arbor crate
//! operates on. Containers are reference counted, so a subtree can be shared
//! between many snapshots and compared by identity in O(1).
//!
//! # Key Types
//!
//! - [`Value`] -- Tagged data value: scalars, timestamps, custom-typed records, sequences, maps
//! - [`Tagged`] -- Custom-typed record; carries fields but is never merged into
//! - [`Key`] -- Map name or sequence index, with string/integer index equivalence
//! - [`Path`] -- Dotted sequence of keys addressing a subtree (`a.b.0`)
//! - [`ValueKind`] -- Discriminant used in diagnostics

pub mod error;
pub mod json;
pub mod key;
pub mod value;

pub use error::TypeError;
pub use json::TAG_FIELD;
pub use key::{Key, Path};
pub use value::{Map, Tagged, Value, ValueKind};
