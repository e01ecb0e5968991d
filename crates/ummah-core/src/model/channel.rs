use serde::{Deserialize, Serialize};

use super::Gender;

/// Per-channel access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    #[serde(rename = "all")]
    All,
    Male,
    Female,
}

impl Access {
    /// O(1) membership check. `None` (unauthenticated) is always denied.
    pub fn permits(self, gender: Option<Gender>) -> bool {
        match (self, gender) {
            (_, None) => false,
            (Access::All, Some(_)) => true,
            (Access::Male, Some(g)) => g == Gender::Male,
            (Access::Female, Some(g)) => g == Gender::Female,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Access::All => "all",
            Access::Male => "Male",
            Access::Female => "Female",
        }
    }
}

/// Static catalog entry. Channels are compile-time constants, never persisted
/// per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub id: &'static str,
    pub name: &'static str,
    pub access: Access,
    /// Icon name for the presentation layer.
    pub icon: &'static str,
}

impl Channel {
    /// Path of the channel's chat route.
    pub fn path(&self) -> String {
        format!("/channels/{}", self.id)
    }
}
