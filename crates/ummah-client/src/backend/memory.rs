//! In-process backend used by tests and the demo binary.
//!
//! Registries are `DashMap`s keyed by email, uid and channel id. Each channel
//! keeps its message log plus the senders of every open live query; a query
//! whose receiver was dropped is pruned on the next push.
//!
//! Failure injection hooks let callers exercise the hardening paths: failed
//! writes, failed subscriptions, dropped live queries, pending timestamps.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use ummah_core::document::{encode_message, ProfileDoc, ProfileUpdate, RawDocument, ServerTimestamp};
use ummah_core::error::{Result, UmmahError};
use ummah_core::MessageDraft;

use super::{AuthSession, IdentityProvider, LiveEvent, LiveQuery, MessageStore, ProfileStore};

struct Account {
    uid: String,
    email: String,
    password: String,
}

struct StoredDoc {
    doc: RawDocument,
    ts: Option<i64>,
}

#[derive(Default)]
struct ChannelLog {
    docs: Vec<StoredDoc>,
    watchers: Vec<mpsc::UnboundedSender<LiveEvent>>,
}

impl ChannelLog {
    /// Timestamp ascending, pending last; equal keys keep insertion order.
    fn snapshot(&self) -> Vec<RawDocument> {
        let mut ordered: Vec<&StoredDoc> = self.docs.iter().collect();
        ordered.sort_by_key(|d| (d.ts.is_none(), d.ts.unwrap_or(0)));
        ordered.into_iter().map(|d| d.doc.clone()).collect()
    }

    fn broadcast(&mut self) {
        let snap = self.snapshot();
        self.watchers
            .retain(|tx| tx.send(LiveEvent::Snapshot(snap.clone())).is_ok());
    }
}

pub struct MemoryBackend {
    accounts: DashMap<String, Account>,
    profiles: DashMap<String, Value>,
    channels: DashMap<String, ChannelLog>,
    reset_requests: DashMap<String, u32>,
    auth: watch::Sender<Option<AuthSession>>,

    clock_ms: AtomicI64,
    clock_step_ms: AtomicI64,
    seq: AtomicU64,

    pending_writes: AtomicBool,
    fail_message_writes: AtomicU32,
    fail_profile_writes: AtomicU32,
    fail_watches: AtomicU32,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (auth, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            profiles: DashMap::new(),
            channels: DashMap::new(),
            reset_requests: DashMap::new(),
            auth,
            clock_ms: AtomicI64::new(chrono::Utc::now().timestamp_millis()),
            clock_step_ms: AtomicI64::new(1),
            seq: AtomicU64::new(1),
            pending_writes: AtomicBool::new(false),
            fail_message_writes: AtomicU32::new(0),
            fail_profile_writes: AtomicU32::new(0),
            fail_watches: AtomicU32::new(0),
        }
    }

    /// Set the server clock. Each assigned timestamp advances it by the step.
    pub fn set_clock(&self, now_ms: i64, step_ms: i64) {
        self.clock_ms.store(now_ms, Ordering::SeqCst);
        self.clock_step_ms.store(step_ms, Ordering::SeqCst);
    }

    /// When on, every append is pushed twice: first with a pending (null)
    /// timestamp, then with the assigned one.
    pub fn set_pending_writes(&self, on: bool) {
        self.pending_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_next_message_writes(&self, n: u32) {
        self.fail_message_writes.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_profile_writes(&self, n: u32) {
        self.fail_profile_writes.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_watches(&self, n: u32) {
        self.fail_watches.store(n, Ordering::SeqCst);
    }

    /// Simulate a lost connection: every open live query on the channel gets
    /// `Dropped` and is deregistered.
    pub fn drop_live_queries(&self, channel_id: &str) {
        if let Some(mut log) = self.channels.get_mut(channel_id) {
            for tx in log.watchers.drain(..) {
                let _ = tx.send(LiveEvent::Dropped("connection lost".into()));
            }
        }
    }

    /// Number of live queries currently held open on a channel.
    pub fn active_live_queries(&self, channel_id: &str) -> usize {
        self.channels
            .get_mut(channel_id)
            .map(|mut log| {
                log.watchers.retain(|tx| !tx.is_closed());
                log.watchers.len()
            })
            .unwrap_or(0)
    }

    /// Append an arbitrary document (possibly malformed) and push.
    pub fn insert_raw(&self, channel_id: &str, doc: RawDocument) {
        let ts = doc
            .data
            .get("timestamp")
            .and_then(|v| ServerTimestamp::deserialize(v).ok())
            .map(ServerTimestamp::to_millis);
        let mut log = self.channels.entry(channel_id.to_string()).or_default();
        log.docs.push(StoredDoc { doc, ts });
        log.broadcast();
    }

    pub fn message_count(&self, channel_id: &str) -> usize {
        self.channels.get(channel_id).map(|l| l.docs.len()).unwrap_or(0)
    }

    pub fn reset_requests(&self, email: &str) -> u32 {
        self.reset_requests
            .get(&email.to_lowercase())
            .map(|c| *c)
            .unwrap_or(0)
    }

    fn next_timestamp(&self) -> i64 {
        let step = self.clock_step_ms.load(Ordering::SeqCst);
        self.clock_ms.fetch_add(step, Ordering::SeqCst)
    }

    fn next_uid(&self) -> String {
        format!("uid-{}", self.seq.fetch_add(1, Ordering::Relaxed))
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthSession> {
        let key = email.to_lowercase();
        let uid = self.next_uid();
        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => return Err(UmmahError::AuthFailed),
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(Account {
                    uid: uid.clone(),
                    email: email.to_string(),
                    password: password.to_string(),
                });
            }
        }
        let session = AuthSession { uid, email: email.to_string() };
        self.auth.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = {
            let acct = self
                .accounts
                .get(&email.to_lowercase())
                .ok_or(UmmahError::AuthFailed)?;
            if acct.password != password {
                return Err(UmmahError::AuthFailed);
            }
            AuthSession { uid: acct.uid.clone(), email: acct.email.clone() }
        };
        self.auth.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.auth.send_replace(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let key = email.to_lowercase();
        if !self.accounts.contains_key(&key) {
            return Err(UmmahError::NotFound("no account for email".into()));
        }
        *self.reset_requests.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn auth_state(&self) -> watch::Receiver<Option<AuthSession>> {
        self.auth.subscribe()
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn get_profile(&self, uid: &str) -> Result<Option<Value>> {
        Ok(self.profiles.get(uid).map(|v| v.value().clone()))
    }

    async fn create_profile(&self, uid: &str, doc: &ProfileDoc) -> Result<()> {
        if Self::take_failure(&self.fail_profile_writes) {
            return Err(UmmahError::Backend("profile write rejected".into()));
        }
        let v = serde_json::to_value(doc)
            .map_err(|e| UmmahError::Internal(format!("profile encode failed: {e}")))?;
        self.profiles.insert(uid.to_string(), v);
        Ok(())
    }

    async fn update_profile(&self, uid: &str, update: &ProfileUpdate) -> Result<()> {
        if Self::take_failure(&self.fail_profile_writes) {
            return Err(UmmahError::Backend("profile write rejected".into()));
        }
        let mut entry = self
            .profiles
            .get_mut(uid)
            .ok_or_else(|| UmmahError::NotFound(format!("profile {uid}")))?;
        let obj = entry
            .as_object_mut()
            .ok_or_else(|| UmmahError::Internal(format!("profile {uid} is not an object")))?;
        if let Some(n) = &update.name {
            obj.insert("name".into(), Value::String(n.clone()));
        }
        if let Some(c) = &update.country {
            obj.insert("country".into(), Value::String(c.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryBackend {
    async fn watch_messages(&self, channel_id: &str) -> Result<LiveQuery> {
        if Self::take_failure(&self.fail_watches) {
            return Err(UmmahError::Backend("live query rejected".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let mut log = self.channels.entry(channel_id.to_string()).or_default();
        // initial snapshot, like any live query
        let _ = tx.send(LiveEvent::Snapshot(log.snapshot()));
        log.watchers.push(tx);
        Ok(LiveQuery::new(rx))
    }

    async fn append_message(&self, channel_id: &str, draft: &MessageDraft) -> Result<String> {
        if Self::take_failure(&self.fail_message_writes) {
            return Err(UmmahError::Backend("message write rejected".into()));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut log = self.channels.entry(channel_id.to_string()).or_default();

        if self.pending_writes.load(Ordering::SeqCst) {
            log.docs.push(StoredDoc {
                doc: RawDocument { id: id.clone(), data: encode_message(draft, None) },
                ts: None,
            });
            log.broadcast();
        }

        let ts = self.next_timestamp();
        let doc = RawDocument {
            id: id.clone(),
            data: encode_message(draft, Some(ServerTimestamp::from_millis(ts))),
        };
        match log.docs.iter_mut().find(|d| d.doc.id == id) {
            Some(pending) => {
                pending.doc = doc;
                pending.ts = Some(ts);
            }
            None => log.docs.push(StoredDoc { doc, ts: Some(ts) }),
        }
        log.broadcast();
        Ok(id)
    }
}
