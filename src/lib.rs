//! Detach/reattach protocol for graph elements and properties, plus a
//! storage-agnostic database/table contract with in-memory and SQLite adapters.
//!
//! Live elements come from a [`structure::Graph`]. They can be snapshotted into
//! [`detached`] forms that cross thread and process boundaries and later resolve
//! back to live state through [`detached::Attachable`].

#![warn(missing_docs)]

pub mod config;
pub mod detached;
pub mod error;
pub mod logging;
pub mod storage;
pub mod structure;
pub mod types;

pub use detached::{
    Attachable, DetachedElement, DetachedProperty, LiveElement, OwnerRef, ReferencedElement,
};
pub use error::{Result, TetherError};
pub use logging::init_logging;
pub use types::{ElementId, ElementKind, ElementReference, Form, Value};
