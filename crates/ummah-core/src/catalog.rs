//! Static channel catalog.
//!
//! The list is configuration compiled into the binary: not persisted, not
//! user-editable. Ids are the only channel ids that exist.

use crate::model::{Access, Channel};

pub const CHANNELS: [Channel; 5] = [
    Channel {
        id: "islam-chat",
        name: "Islam Chat",
        access: Access::All,
        icon: "message-circle",
    },
    Channel {
        id: "multilingual-mixed",
        name: "Multilingual Mixed",
        access: Access::All,
        icon: "languages",
    },
    Channel {
        id: "brothers-section",
        name: "Brothers Section",
        access: Access::Male,
        icon: "user",
    },
    Channel {
        id: "sisters-section",
        name: "Sisters Section",
        access: Access::Female,
        icon: "user-round",
    },
    Channel {
        id: "study-circles",
        name: "Study Circles",
        access: Access::All,
        icon: "book-open",
    },
];

/// Look up a channel by id.
pub fn find(id: &str) -> Option<&'static Channel> {
    CHANNELS.iter().find(|c| c.id == id)
}

pub fn all() -> &'static [Channel] {
    &CHANNELS
}
