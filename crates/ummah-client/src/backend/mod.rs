//! Backend boundary: identity, profile documents, and channel message logs.
//!
//! The hosted backend is an external collaborator. These traits are the only
//! surface the client depends on; `MemoryBackend` implements all of them
//! in-process.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use ummah_core::document::{ProfileDoc, ProfileUpdate, RawDocument};
use ummah_core::error::Result;
use ummah_core::MessageDraft;

pub use memory::MemoryBackend;

/// Identity of a signed-in account, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn sign_out(&self) -> Result<()>;
    async fn send_password_reset(&self, email: &str) -> Result<()>;
    /// Current session, updated on every sign-in/sign-out.
    fn auth_state(&self) -> watch::Receiver<Option<AuthSession>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Raw profile document, `None` if the user has none.
    async fn get_profile(&self, uid: &str) -> Result<Option<Value>>;
    async fn create_profile(&self, uid: &str, doc: &ProfileDoc) -> Result<()>;
    async fn update_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<()>;
}

/// One push from a live query.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// Full result set ordered by timestamp ascending.
    Snapshot(Vec<RawDocument>),
    /// The backend lost the query; no further events follow.
    Dropped(String),
}

/// Receiving end of a live query. Dropping it releases the query.
pub struct LiveQuery {
    events: mpsc::UnboundedReceiver<LiveEvent>,
}

impl LiveQuery {
    pub fn new(events: mpsc::UnboundedReceiver<LiveEvent>) -> Self {
        Self { events }
    }

    /// Next push, or `None` once the backend closed the query.
    pub async fn next(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Open a live query over a channel's messages, ordered by timestamp
    /// ascending. The first event is the current snapshot.
    async fn watch_messages(&self, channel_id: &str) -> Result<LiveQuery>;

    /// Append a message with a server-assigned timestamp. Returns the new id.
    async fn append_message(&self, channel_id: &str, draft: &MessageDraft) -> Result<String>;
}
