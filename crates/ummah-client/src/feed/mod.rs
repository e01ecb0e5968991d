//! Live channel feed: subscription lifecycle, ordered snapshot view, local
//! filtering and message submission.

mod channel_feed;
mod view;

pub use channel_feed::{ChannelFeed, FeedSnapshot, FeedState, SendOutcome, SkipReason};
pub use view::{filter_messages, order_messages};
