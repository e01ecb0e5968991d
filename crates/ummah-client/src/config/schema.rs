use std::time::Duration;

use serde::Deserialize;
use ummah_core::error::{Result, UmmahError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub signup: SignupSection,

    #[serde(default)]
    pub profile: ProfileSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            feed: FeedSection::default(),
            signup: SignupSection::default(),
            profile: ProfileSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(UmmahError::UnsupportedVersion);
        }

        self.feed.validate()?;
        self.signup.validate()?;
        self.profile.validate()?;

        Ok(())
    }
}

/// Same-timestamp ordering inside a feed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lexical message id as secondary key (deterministic).
    #[default]
    MessageId,
    /// Keep the order the backend delivered.
    Backend,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedSection {
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    /// 0 = retry forever.
    #[serde(default)]
    pub max_reconnect_attempts: u32,

    #[serde(default)]
    pub tie_break: TieBreak,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            max_reconnect_attempts: 0,
            tie_break: TieBreak::default(),
        }
    }
}

impl FeedSection {
    pub fn validate(&self) -> Result<()> {
        if !(50..=10_000).contains(&self.reconnect_initial_ms) {
            return Err(UmmahError::BadRequest(
                "feed.reconnect_initial_ms must be between 50 and 10000".into(),
            ));
        }
        if self.reconnect_max_ms > 300_000 {
            return Err(UmmahError::BadRequest(
                "feed.reconnect_max_ms must be at most 300000".into(),
            ));
        }
        if self.reconnect_max_ms < self.reconnect_initial_ms {
            return Err(UmmahError::BadRequest(
                "feed.reconnect_max_ms must not be less than reconnect_initial_ms".into(),
            ));
        }
        Ok(())
    }

    /// Delay before reconnect attempt `attempt` (0-based): doubling, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.reconnect_initial_ms);
        let max = Duration::from_millis(self.reconnect_max_ms);
        std::cmp::min(initial.saturating_mul(2u32.saturating_pow(attempt)), max)
    }
}

fn default_reconnect_initial_ms() -> u64 {
    500
}
fn default_reconnect_max_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupSection {
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    #[serde(default = "default_min_age_years")]
    pub min_age_years: u32,
}

impl Default for SignupSection {
    fn default() -> Self {
        Self {
            min_password_len: default_min_password_len(),
            min_age_years: default_min_age_years(),
        }
    }
}

impl SignupSection {
    pub fn validate(&self) -> Result<()> {
        if !(6..=128).contains(&self.min_password_len) {
            return Err(UmmahError::BadRequest(
                "signup.min_password_len must be between 6 and 128".into(),
            ));
        }
        if self.min_age_years > 120 {
            return Err(UmmahError::BadRequest(
                "signup.min_age_years must be at most 120".into(),
            ));
        }
        Ok(())
    }
}

fn default_min_password_len() -> usize {
    8
}
fn default_min_age_years() -> u32 {
    13
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSection {
    #[serde(default = "default_min_name_len")]
    pub min_name_len: usize,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self { min_name_len: default_min_name_len() }
    }
}

impl ProfileSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.min_name_len) {
            return Err(UmmahError::BadRequest(
                "profile.min_name_len must be between 1 and 64".into(),
            ));
        }
        Ok(())
    }
}

fn default_min_name_len() -> usize {
    2
}
