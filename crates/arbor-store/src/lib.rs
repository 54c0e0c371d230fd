//! State container for Arbor.
//!
//! Holds the current snapshot of a value tree and moves it forward one
//! [`Command`] at a time:
//!
//! - `Write` merges a payload into the current state (structural sharing)
//! - `Overwrite` replaces the state wholesale
//! - `Reset` reinstalls the configured initial state
//!
//! The reducer is a pure function ([`reduce`], [`reduce_slice`]); [`Store`]
//! wraps it with a lock, a revision counter and fan-out of [`StoreEvent`]s to
//! subscribers.

pub mod command;
pub mod config;
pub mod error;
pub mod reducer;
pub mod store;

pub use command::{read_commands, Command, CommandKind};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use reducer::{reduce, reduce_slice};
pub use store::{EventFilter, Store, StoreEvent, StoreEvents};
