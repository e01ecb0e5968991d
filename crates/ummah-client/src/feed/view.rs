//! Pure snapshot operations: ordering and text filtering.

use std::cmp::Ordering;

use ummah_core::Message;

use crate::config::TieBreak;

/// Timestamp ascending; pending (absent) timestamps after all assigned ones.
/// The sort is stable, so `TieBreak::Backend` keeps delivery order for equal
/// keys, and pending messages always do.
pub fn order_messages(msgs: &mut [Message], tie_break: TieBreak) {
    msgs.sort_by(|a, b| {
        let primary = match (a.timestamp, b.timestamp) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match (tie_break, a.timestamp, b.timestamp) {
            // pending writes keep delivery order until the server assigns times
            (TieBreak::MessageId, Some(_), Some(_)) => primary.then_with(|| a.id.cmp(&b.id)),
            _ => primary,
        }
    });
}

/// Case-insensitive substring match on text or author name. An empty term
/// passes everything.
pub fn filter_messages<'a>(msgs: &'a [Message], term: &str) -> Vec<&'a Message> {
    if term.is_empty() {
        return msgs.iter().collect();
    }
    let needle = term.to_lowercase();
    msgs.iter()
        .filter(|m| {
            m.text.to_lowercase().contains(&needle)
                || m.author.name.to_lowercase().contains(&needle)
        })
        .collect()
}
