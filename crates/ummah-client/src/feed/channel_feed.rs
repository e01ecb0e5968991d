use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ummah_core::access;
use ummah_core::document::{decode_snapshot, RawDocument};
use ummah_core::error::{Result, UmmahError};
use ummah_core::{Channel, Message, MessageDraft, User};

use crate::backend::{LiveEvent, MessageStore};
use crate::config::FeedSection;
use crate::notice::{Notice, NoticeSink};
use crate::obs::ClientMetrics;

use super::view::{filter_messages, order_messages};

/// Called with every published snapshot.
pub type SnapshotHandler = Arc<dyn Fn(&FeedSnapshot) + Send + Sync>;
/// Called once per snapshot revision, after every snapshot handler ran.
pub type ScrollHandler = Arc<dyn Fn(u64) + Send + Sync>;

/// Lifecycle of one feed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Created, not started.
    Idle,
    /// Opening the live query.
    Subscribing,
    /// At least one snapshot applied since the query was opened.
    Live,
    /// Live query lost; waiting on backoff before reopening.
    Reconnecting { attempt: u32 },
    /// Stopped by the owner.
    Unsubscribed,
    /// Gave up after exhausting reconnect attempts.
    Failed,
}

impl FeedState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FeedState::Unsubscribed | FeedState::Failed)
    }
}

/// Complete, ordered view of a channel as of one backend push.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Increments with every applied push. 0 = nothing received yet.
    pub revision: u64,
    pub messages: Arc<Vec<Message>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    NotSignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Write acknowledged; the message shows up with the next push.
    Sent { id: String },
    /// Nothing was written.
    Skipped(SkipReason),
}

struct FeedShared {
    channel: &'static Channel,
    store: Arc<dyn MessageStore>,
    cfg: FeedSection,
    metrics: Arc<ClientMetrics>,
    notices: Arc<dyn NoticeSink>,
    state: watch::Sender<FeedState>,
    latest: watch::Sender<FeedSnapshot>,
    on_snapshot: Mutex<Vec<SnapshotHandler>>,
    on_scroll: Mutex<Vec<ScrollHandler>>,
}

impl FeedShared {
    /// Terminal states are sticky.
    fn set_state(&self, next: FeedState) {
        self.state.send_if_modified(|s| {
            if s.is_terminal() || *s == next {
                return false;
            }
            *s = next;
            true
        });
    }

    fn apply(&self, docs: Vec<RawDocument>) {
        if self.state.borrow().is_terminal() {
            return;
        }
        let channel = self.channel.id;

        let (mut msgs, rejected) = decode_snapshot(&docs);
        for r in &rejected {
            warn!(channel, id = %r.id, error = %r.error, "rejected malformed message document");
        }
        if !rejected.is_empty() {
            self.metrics
                .feed_rejected_documents
                .add(&[("channel", channel)], rejected.len() as u64);
        }
        order_messages(&mut msgs, self.cfg.tie_break);

        let revision = self.latest.borrow().revision + 1;
        let snap = FeedSnapshot { revision, messages: Arc::new(msgs) };
        self.latest.send_replace(snap.clone());
        self.set_state(FeedState::Live);
        self.metrics.feed_snapshots.inc(&[("channel", channel)]);
        debug!(channel, revision, len = snap.messages.len(), "snapshot applied");

        let handlers = self
            .on_snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for h in &handlers {
            h(&snap);
        }

        // render complete: scroll exactly once for this revision
        let scroll = self
            .on_scroll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for s in &scroll {
            s(revision);
        }
    }
}

/// Handle over one channel's live message feed.
///
/// `start` opens the live query on a background task, `stop` releases it.
/// Stopping is idempotent and also happens on drop, so a feed can never leak
/// its query. A stopped feed cannot be restarted; open a new one instead.
pub struct ChannelFeed {
    shared: Arc<FeedShared>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChannelFeed {
    pub fn new(
        channel: &'static Channel,
        store: Arc<dyn MessageStore>,
        cfg: FeedSection,
        metrics: Arc<ClientMetrics>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let (state, _) = watch::channel(FeedState::Idle);
        let (latest, _) = watch::channel(FeedSnapshot::default());
        Self {
            shared: Arc::new(FeedShared {
                channel,
                store,
                cfg,
                metrics,
                notices,
                state,
                latest,
                on_snapshot: Mutex::new(Vec::new()),
                on_scroll: Mutex::new(Vec::new()),
            }),
            stop_tx: None,
            task: None,
        }
    }

    pub fn channel(&self) -> &'static Channel {
        self.shared.channel
    }

    pub fn state(&self) -> FeedState {
        *self.shared.state.borrow()
    }

    pub fn state_receiver(&self) -> watch::Receiver<FeedState> {
        self.shared.state.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.shared.latest.borrow().clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<FeedSnapshot> {
        self.shared.latest.subscribe()
    }

    pub fn on_snapshot<F>(&self, f: F)
    where
        F: Fn(&FeedSnapshot) + Send + Sync + 'static,
    {
        self.shared
            .on_snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(f));
    }

    pub fn on_scroll_to_latest<F>(&self, f: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.shared
            .on_scroll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(f));
    }

    /// Open the live query. Must be called within a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        let current = self.state();
        if current != FeedState::Idle {
            return Err(UmmahError::BadRequest(format!(
                "feed for {} cannot start from {current:?}",
                self.shared.channel.id
            )));
        }

        self.shared.set_state(FeedState::Subscribing);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        self.task = Some(tokio::spawn(run(Arc::clone(&self.shared), stop_rx)));

        self.shared
            .metrics
            .feeds_active
            .inc(&[("channel", self.shared.channel.id)]);
        info!(channel = self.shared.channel.id, "feed subscribing");
        Ok(())
    }

    /// Release the live query and wait for the feed task to finish. No
    /// snapshot is delivered after this returns.
    pub async fn stop(&mut self) {
        if let Some(task) = self.release() {
            let _ = task.await;
        }
    }

    fn release(&mut self) -> Option<JoinHandle<()>> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        self.shared.set_state(FeedState::Unsubscribed);

        let task = self.task.take();
        if task.is_some() {
            self.shared
                .metrics
                .feeds_active
                .dec(&[("channel", self.shared.channel.id)]);
            info!(channel = self.shared.channel.id, "feed unsubscribed");
        }
        task
    }

    /// Messages of the held snapshot matching `term`. Never touches the
    /// backend.
    pub fn filter(&self, term: &str) -> Vec<Message> {
        let snap = self.snapshot();
        filter_messages(&snap.messages, term).into_iter().cloned().collect()
    }

    /// Write a message. Empty text or a missing author is a no-op. The view
    /// is not updated optimistically; the next push carries the message.
    /// A failed write is reported to the user and returned.
    pub async fn send(&self, text: &str, author: Option<&User>) -> Result<SendOutcome> {
        let Some(author) = author else {
            return Ok(SendOutcome::Skipped(SkipReason::NotSignedIn));
        };
        let Some(draft) = MessageDraft::new(text, author) else {
            return Ok(SendOutcome::Skipped(SkipReason::EmptyText));
        };

        let channel = self.shared.channel;
        access::authorize_post(Some(author), channel)?;
        if self.state() == FeedState::Unsubscribed {
            return Err(UmmahError::BadRequest(format!("feed for {} is closed", channel.id)));
        }

        match self.shared.store.append_message(channel.id, &draft).await {
            Ok(id) => {
                self.shared.metrics.message_sends.inc(&[("channel", channel.id)]);
                debug!(channel = channel.id, %id, "message written");
                Ok(SendOutcome::Sent { id })
            }
            Err(e) => {
                self.shared
                    .metrics
                    .message_send_failures
                    .inc(&[("channel", channel.id)]);
                warn!(channel = channel.id, error = %e, "message write failed");
                self.shared.notices.push(Notice::error(
                    "Message Not Sent",
                    "Your message could not be delivered. Please try again.",
                ));
                Err(e)
            }
        }
    }
}

impl Drop for ChannelFeed {
    fn drop(&mut self) {
        if let Some(task) = self.release() {
            task.abort();
        }
    }
}

async fn run(shared: Arc<FeedShared>, mut stop_rx: oneshot::Receiver<()>) {
    let channel = shared.channel.id;
    let mut attempt: u32 = 0;

    loop {
        let opened = tokio::select! {
            _ = &mut stop_rx => break,
            r = shared.store.watch_messages(channel) => r,
        };

        let reason = match opened {
            Ok(mut query) => loop {
                tokio::select! {
                    _ = &mut stop_rx => return,
                    ev = query.next() => match ev {
                        Some(LiveEvent::Snapshot(docs)) => {
                            shared.apply(docs);
                            attempt = 0;
                        }
                        Some(LiveEvent::Dropped(reason)) => break reason,
                        None => break "live query closed".to_string(),
                    },
                }
            },
            Err(e) => e.to_string(),
        };
        // the old query is released here, before any reopen

        let max = shared.cfg.max_reconnect_attempts;
        if max > 0 && attempt >= max {
            warn!(channel, %reason, attempts = attempt, "feed giving up");
            shared.set_state(FeedState::Failed);
            shared.notices.push(Notice::error(
                "Connection Lost",
                format!("Could not reconnect to {}. Please reopen the channel.", shared.channel.name),
            ));
            break;
        }

        let delay = shared.cfg.backoff(attempt);
        attempt += 1;
        warn!(channel, %reason, attempt, delay_ms = delay.as_millis() as u64, "live query lost, reconnecting");
        shared.set_state(FeedState::Reconnecting { attempt });
        shared.metrics.feed_reconnects.inc(&[("channel", channel)]);

        tokio::select! {
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep(delay) => {}
        }
        shared.set_state(FeedState::Subscribing);
    }
}
