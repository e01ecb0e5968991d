//! UmmahConnect core: domain types, the static channel catalog, channel access
//! policy, strict backend document decoders, and the shared error surface.
//!
//! This crate carries no runtime or backend dependencies so the same rules can
//! be evaluated anywhere a channel list or chat view is rendered.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `UmmahError`/`Result`, malformed backend documents included.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod access;
pub mod catalog;
pub mod document;
pub mod error;
pub mod model;
pub mod validate;

/// Shared result type.
pub use error::{Result, UmmahError};
pub use model::{Access, Author, Channel, Edited, Gender, Message, MessageDraft, User};
