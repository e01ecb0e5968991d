//! Channel access policy.
//!
//! A user may view and post in a channel iff they are signed in and the
//! channel's rule is `all` or equals their gender. Callers must keep "channel
//! does not exist" apart from "channel exists but access denied".

use crate::catalog;
use crate::error::{Result, UmmahError};
use crate::model::{Channel, Gender, User};

/// Outcome of resolving a channel id for a (possibly absent) user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAccess {
    /// Id is not in the catalog.
    NotFound,
    /// Channel exists, user may not view or post.
    Denied(&'static Channel),
    /// Channel exists, user may view and post.
    Allowed(&'static Channel),
}

impl ChannelAccess {
    pub fn channel(&self) -> Option<&'static Channel> {
        match self {
            ChannelAccess::NotFound => None,
            ChannelAccess::Denied(c) | ChannelAccess::Allowed(c) => Some(c),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, ChannelAccess::Allowed(_))
    }
}

pub fn is_allowed(user: Option<&User>, channel: &Channel) -> bool {
    channel.access.permits(user.map(|u| u.gender))
}

pub fn is_allowed_for(gender: Option<Gender>, channel: &Channel) -> bool {
    channel.access.permits(gender)
}

/// Resolve `channel_id` against the static catalog.
pub fn evaluate(channel_id: &str, user: Option<&User>) -> ChannelAccess {
    match catalog::find(channel_id) {
        None => ChannelAccess::NotFound,
        Some(c) if is_allowed(user, c) => ChannelAccess::Allowed(c),
        Some(c) => ChannelAccess::Denied(c),
    }
}

/// Guard for writes: same rule as viewing, reported as an error.
pub fn authorize_post(user: Option<&User>, channel: &Channel) -> Result<()> {
    match user {
        None => Err(UmmahError::AuthFailed),
        Some(u) if is_allowed(Some(u), channel) => Ok(()),
        Some(u) => Err(UmmahError::NotAllowed(format!(
            "{} is restricted to {} members (user is {})",
            channel.id,
            channel.access.as_str(),
            u.gender
        ))),
    }
}
