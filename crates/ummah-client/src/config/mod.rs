//! Loading of `ummah.yaml`.
//!
//! Parsing rejects unknown keys in every section; the parsed config is then
//! range-checked before anything uses it. Missing sections take defaults.

pub mod schema;

use std::fs;

use ummah_core::error::{Result, UmmahError};

pub use schema::{ClientConfig, FeedSection, ProfileSection, SignupSection, TieBreak};

/// Read and validate a config file.
pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| UmmahError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Parse and validate YAML text. Syntax and unknown-key errors map to
/// `BadRequest`.
pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| UmmahError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
