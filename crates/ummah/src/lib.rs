//! UmmahConnect in one dependency.
//!
//! `core` holds the channel catalog, access rules and document decoding;
//! `client` holds the session, live feeds and the in-process backend.

pub mod core {
    pub use ummah_core::*;
}

pub mod client {
    pub use ummah_client::*;
}
