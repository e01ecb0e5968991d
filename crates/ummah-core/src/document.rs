//! Backend document schemas and strict decoders.
//!
//! Documents arrive from the backend as untyped JSON. Every decoder here
//! rejects unknown fields, missing fields and wrong types instead of trusting
//! the shape at runtime.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, UmmahError};
use crate::model::{Author, Edited, Gender, Message, MessageDraft, User};

/// A document as delivered by the backend: id plus untyped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDocument {
    pub id: String,
    pub data: Value,
}

/// Server-assigned timestamp in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl ServerTimestamp {
    pub fn from_millis(ms: i64) -> Self {
        Self {
            seconds: ms.div_euclid(1000),
            nanos: (ms.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    /// Epoch milliseconds.
    pub fn to_millis(self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanos / 1_000_000))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageDoc {
    text: String,
    author: Author,
    // null while the write is pending acknowledgement
    timestamp: Option<ServerTimestamp>,
    #[serde(default)]
    edited: Option<Edited>,
}

/// Decode one message document.
pub fn decode_message(doc: &RawDocument) -> Result<Message> {
    if doc.id.is_empty() {
        return Err(UmmahError::Decode("message document without id".into()));
    }

    let raw = MessageDoc::deserialize(&doc.data)
        .map_err(|e| UmmahError::Decode(format!("message {}: {e}", doc.id)))?;

    if raw.author.id.trim().is_empty() {
        return Err(UmmahError::Decode(format!("message {}: empty author.id", doc.id)));
    }

    if let Some(ts) = raw.timestamp {
        if ts.nanos >= 1_000_000_000 {
            return Err(UmmahError::Decode(format!(
                "message {}: timestamp nanos out of range",
                doc.id
            )));
        }
    }

    Ok(Message {
        id: doc.id.clone(),
        text: raw.text,
        timestamp: raw.timestamp.map(ServerTimestamp::to_millis),
        author: raw.author,
        edited: raw.edited,
    })
}

/// A document that failed to decode, kept for logging and metrics.
#[derive(Debug)]
pub struct Rejected {
    pub id: String,
    pub error: UmmahError,
}

/// Decode a full snapshot, preserving backend order. Malformed documents are
/// returned separately instead of failing the whole snapshot.
pub fn decode_snapshot(docs: &[RawDocument]) -> (Vec<Message>, Vec<Rejected>) {
    let mut ok = Vec::with_capacity(docs.len());
    let mut rejected = Vec::new();
    for d in docs {
        match decode_message(d) {
            Ok(m) => ok.push(m),
            Err(error) => {
                tracing::debug!(id = %d.id, %error, "message document rejected");
                rejected.push(Rejected { id: d.id.clone(), error });
            }
        }
    }
    (ok, rejected)
}

/// Payload written for a new message. `timestamp` is `None` for a pending
/// write.
pub fn encode_message(draft: &MessageDraft, timestamp: Option<ServerTimestamp>) -> Value {
    json!({
        "text": draft.text,
        "author": {
            "id": draft.author.id,
            "name": draft.author.name,
            "gender": draft.author.gender,
        },
        "timestamp": timestamp,
    })
}

/// Per-user profile document keyed by user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDoc {
    pub email: String,
    pub name: String,
    pub country: String,
    pub gender: Gender,
    pub dob: String,
}

impl ProfileDoc {
    pub fn decode(data: &Value) -> Result<Self> {
        Self::deserialize(data).map_err(|e| UmmahError::Decode(format!("profile: {e}")))
    }

    pub fn into_user(self, id: impl Into<String>) -> User {
        User {
            id: id.into(),
            email: self.email,
            name: self.name,
            country: self.country,
            gender: self.gender,
            dob: self.dob,
        }
    }
}

/// Partial profile update. Only name and country are mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.country.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(n) = &self.name {
            user.name = n.clone();
        }
        if let Some(c) = &self.country {
            user.country = c.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_roundtrip_through_wire_form() {
        let ts = ServerTimestamp::from_millis(1_700_000_123_456);
        assert_eq!(ts.seconds, 1_700_000_123);
        assert_eq!(ts.nanos, 456_000_000);
        assert_eq!(ts.to_millis(), 1_700_000_123_456);
    }

    #[test]
    fn pending_timestamp_is_absent_not_zero() {
        let doc = RawDocument {
            id: "m1".into(),
            data: json!({
                "text": "salam",
                "author": { "id": "u1", "name": "Ali", "gender": "Male" },
                "timestamp": null
            }),
        };
        let m = decode_message(&doc).unwrap();
        assert_eq!(m.timestamp, None);
    }

    #[test]
    fn profile_update_serializes_only_set_fields() {
        let up = ProfileUpdate { name: None, country: Some("Malaysia".into()) };
        assert_eq!(serde_json::to_value(&up).unwrap(), json!({ "country": "Malaysia" }));
    }
}
