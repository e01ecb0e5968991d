#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ummah_client::config::{self, TieBreak};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
feed:
  reconnect_initial_ms: 500
  reconect_max_ms: 1000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.feed.reconnect_initial_ms, 500);
    assert_eq!(cfg.feed.reconnect_max_ms, 30_000);
    assert_eq!(cfg.feed.tie_break, TieBreak::MessageId);
    assert_eq!(cfg.signup.min_password_len, 8);
    assert_eq!(cfg.signup.min_age_years, 13);
    assert_eq!(cfg.profile.min_name_len, 2);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
feed:
  reconnect_initial_ms: 200
  reconnect_max_ms: 5000
  max_reconnect_attempts: 4
  tie_break: backend
signup:
  min_password_len: 10
  min_age_years: 16
profile:
  min_name_len: 3
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.feed.max_reconnect_attempts, 4);
    assert_eq!(cfg.feed.tie_break, TieBreak::Backend);
    assert_eq!(cfg.signup.min_password_len, 10);
    assert_eq!(cfg.profile.min_name_len, 3);
}

#[test]
fn wrong_version_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn out_of_range_values_rejected() {
    for bad in [
        "version: 1\nfeed:\n  reconnect_initial_ms: 10\n",
        "version: 1\nfeed:\n  reconnect_initial_ms: 2000\n  reconnect_max_ms: 1000\n",
        "version: 1\nsignup:\n  min_password_len: 2\n",
        "version: 1\nprofile:\n  min_name_len: 0\n",
        "version: 1\nfeed:\n  tie_break: random\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST", "{bad}");
    }
}

#[test]
fn shipped_config_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../ummah.yaml");
    let cfg = config::load_from_file(path).expect("ummah.yaml must load");
    assert_eq!(cfg.feed.max_reconnect_attempts, 0);
    assert_eq!(cfg.feed.tie_break, TieBreak::MessageId);
}
