//! UmmahConnect client library entry.
//!
//! This crate wires the backend boundary, session context, live channel feeds,
//! routing helpers and the chat view controller into one client stack. It is
//! consumed by the demo binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod backend;
pub mod chat;
pub mod config;
pub mod feed;
pub mod notice;
pub mod obs;
pub mod router;
pub mod session;
