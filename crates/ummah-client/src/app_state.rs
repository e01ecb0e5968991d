//! Shared application state: config, backends, session, metrics, notices.
//!
//! Cheap to clone; every view controller holds one.

use std::sync::Arc;

use ummah_core::error::Result;
use ummah_core::Channel;

use crate::backend::{IdentityProvider, MemoryBackend, MessageStore, ProfileStore};
use crate::config::ClientConfig;
use crate::feed::ChannelFeed;
use crate::notice::NoticeSink;
use crate::obs::ClientMetrics;
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ClientConfig,
    session: Arc<Session>,
    messages: Arc<dyn MessageStore>,
    metrics: Arc<ClientMetrics>,
    notices: Arc<dyn NoticeSink>,
}

impl AppState {
    /// Build application state. The config is re-validated so a hand-built
    /// one cannot skip the range checks.
    pub fn new(
        cfg: ClientConfig,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        messages: Arc<dyn MessageStore>,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(ClientMetrics::new());
        let session = Arc::new(Session::new(
            identity,
            profiles,
            cfg.signup.clone(),
            cfg.profile.clone(),
            Arc::clone(&notices),
            Arc::clone(&metrics),
        ));

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, session, messages, metrics, notices }),
        })
    }

    /// All three backend roles served by one in-process backend.
    pub fn with_memory_backend(
        cfg: ClientConfig,
        backend: Arc<MemoryBackend>,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<Self> {
        Self::new(
            cfg,
            Arc::clone(&backend) as Arc<dyn IdentityProvider>,
            Arc::clone(&backend) as Arc<dyn ProfileStore>,
            backend as Arc<dyn MessageStore>,
            notices,
        )
    }

    pub fn cfg(&self) -> &ClientConfig {
        &self.inner.cfg
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.inner.session)
    }

    pub fn metrics(&self) -> Arc<ClientMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn notices(&self) -> Arc<dyn NoticeSink> {
        Arc::clone(&self.inner.notices)
    }

    /// A new, not yet started feed for `channel`.
    pub fn feed_for(&self, channel: &'static Channel) -> ChannelFeed {
        ChannelFeed::new(
            channel,
            Arc::clone(&self.inner.messages),
            self.inner.cfg.feed.clone(),
            self.metrics(),
            self.notices(),
        )
    }
}
