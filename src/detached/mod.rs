//! Non-live element and property representations and their reattachment.
//!
//! A live element is snapshotted into a [`ReferencedElement`] (identity only) or a
//! [`DetachedElement`] / [`DetachedProperty`] (identity plus payload). Snapshots are
//! immutable and never observe later mutation of their source. Detached instances
//! resolve back to current live state through [`Attachable`].

mod attach;
mod element;
mod owner;
mod property;
mod referenced;

pub use attach::{Attachable, LiveElement};
pub use element::DetachedElement;
pub use owner::OwnerRef;
pub use property::DetachedProperty;
pub use referenced::ReferencedElement;
