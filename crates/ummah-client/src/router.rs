//! Route guards and channel route resolution.
//!
//! Pure functions over the session state; the presentation layer decides
//! how to render each outcome.

use ummah_core::access::{self, ChannelAccess};
use ummah_core::{catalog, Channel, User};

use crate::session::SessionState;

pub const LOGIN: &str = "/login";
pub const HOME: &str = "/";
/// Landing channel for a signed-in user at `/`.
pub const DEFAULT_CHANNEL: &str = "/channels/islam-chat";

/// Pages reachable without a session.
pub const AUTH_PAGES: [&str; 3] = ["/login", "/signup", "/forgot-password"];

pub fn is_auth_page(path: &str) -> bool {
    AUTH_PAGES.contains(&path)
}

/// Where to redirect, if anywhere. Nothing is decided while the session is
/// still loading.
pub fn guard(state: &SessionState, path: &str) -> Option<&'static str> {
    match state {
        SessionState::Loading => None,
        SessionState::SignedOut if !is_auth_page(path) => Some(LOGIN),
        SessionState::SignedIn(_) if path == HOME => Some(DEFAULT_CHANNEL),
        SessionState::SignedIn(_) if is_auth_page(path) => Some(HOME),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRoute {
    Loading,
    NotFound,
    AccessDenied(&'static Channel),
    Chat(&'static Channel),
}

/// Channel page resolution (`/channels/{id}`). Denied and unknown are distinct states.
pub fn resolve_channel(state: &SessionState, channel_id: &str) -> ChannelRoute {
    if state.is_loading() {
        return ChannelRoute::Loading;
    }
    match access::evaluate(channel_id, state.user()) {
        ChannelAccess::NotFound => ChannelRoute::NotFound,
        ChannelAccess::Denied(c) => ChannelRoute::AccessDenied(c),
        ChannelAccess::Allowed(c) => ChannelRoute::Chat(c),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub channel: &'static Channel,
    pub allowed: bool,
    /// The entry for the page currently shown.
    pub active: bool,
    pub href: String,
    pub tooltip: String,
}

/// One entry per catalog channel, in catalog order. `current_path` marks the
/// active entry.
pub fn sidebar(user: &User, current_path: &str) -> Vec<SidebarEntry> {
    catalog::all()
        .iter()
        .map(|c| {
            let allowed = access::is_allowed(Some(user), c);
            let (href, tooltip) = if allowed {
                (c.path(), c.name.to_string())
            } else {
                ("#".to_string(), format!("{} (Access Restricted)", c.name))
            };
            SidebarEntry { channel: c, allowed, active: current_path == c.path(), href, tooltip }
        })
        .collect()
}
