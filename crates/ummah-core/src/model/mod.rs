//! Domain model shared by the access evaluator, the feed, and the session.

mod channel;
mod message;
mod user;

pub use channel::{Access, Channel};
pub use message::{Author, Edited, Message, MessageDraft};
pub use user::{Gender, User};
