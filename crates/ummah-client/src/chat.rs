//! Chat view controller: the active channel, its feed, the composer draft and
//! the search term.

use tracing::info;

use ummah_core::error::{Result, UmmahError};
use ummah_core::Message;

use crate::app_state::AppState;
use crate::feed::{ChannelFeed, SendOutcome};
use crate::router::{self, ChannelRoute};

/// Owns at most one live feed. Opening another channel releases the previous
/// feed before the next one subscribes.
pub struct ChatView {
    state: AppState,
    route: ChannelRoute,
    feed: Option<ChannelFeed>,
    draft: String,
    search: String,
}

impl ChatView {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            route: ChannelRoute::Loading,
            feed: None,
            draft: String::new(),
            search: String::new(),
        }
    }

    /// Navigate to a channel. Only an allowed channel gets a feed.
    pub async fn open(&mut self, channel_id: &str) -> Result<ChannelRoute> {
        self.close().await;

        let route = router::resolve_channel(&self.state.session().state(), channel_id);
        if let ChannelRoute::Chat(channel) = route {
            let mut feed = self.state.feed_for(channel);
            feed.start()?;
            self.feed = Some(feed);
        }
        info!(channel_id, ?route, "channel opened");
        self.route = route;
        Ok(route)
    }

    pub async fn close(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop().await;
        }
        self.draft.clear();
        self.search.clear();
    }

    pub fn route(&self) -> ChannelRoute {
        self.route
    }

    pub fn feed(&self) -> Option<&ChannelFeed> {
        self.feed.as_ref()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Held snapshot filtered by the current search term.
    pub fn visible_messages(&self) -> Vec<Message> {
        self.feed
            .as_ref()
            .map(|f| f.filter(&self.search))
            .unwrap_or_default()
    }

    /// Send the draft. The draft is kept unless the write was acknowledged.
    pub async fn submit(&mut self) -> Result<SendOutcome> {
        let feed = self.feed.as_ref().ok_or_else(|| {
            UmmahError::NotAllowed("no channel open for posting".into())
        })?;
        let user = self.state.session().current_user();
        let outcome = feed.send(&self.draft, user.as_ref()).await?;
        if matches!(outcome, SendOutcome::Sent { .. }) {
            self.draft.clear();
        }
        Ok(outcome)
    }
}
