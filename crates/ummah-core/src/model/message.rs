use serde::{Deserialize, Serialize};

use super::{Gender, User};

/// Denormalized author snapshot embedded at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub gender: Gender,
}

impl Author {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name().to_string(),
            gender: user.gender,
        }
    }
}

/// Edit marker. Decoded when present; this client never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Edited {
    pub at: i64,
    pub by: String,
}

/// A chat message as held in a feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub text: String,
    /// Epoch milliseconds. `None` while the server timestamp is pending.
    pub timestamp: Option<i64>,
    pub author: Author,
    pub edited: Option<Edited>,
}

/// Outgoing message before the backend assigns an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub text: String,
    pub author: Author,
}

impl MessageDraft {
    /// Build a draft from raw composer input. Returns `None` when the trimmed
    /// text is empty.
    pub fn new(text: &str, author: &User) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            author: Author::from_user(author),
        })
    }
}
