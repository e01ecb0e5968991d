#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use ummah_client::app_state::AppState;
use ummah_client::backend::{IdentityProvider, MemoryBackend, ProfileStore};
use ummah_client::config::ClientConfig;
use ummah_client::notice::NoticeLog;
use ummah_client::session::{SessionState, SignupDetails};
use ummah_core::document::{ProfileDoc, ProfileUpdate};
use ummah_core::Gender;

struct Harness {
    backend: Arc<MemoryBackend>,
    notices: Arc<NoticeLog>,
    state: AppState,
}

fn harness() -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let notices = Arc::new(NoticeLog::new());
    let state =
        AppState::with_memory_backend(ClientConfig::default(), backend.clone(), notices.clone())
            .unwrap();
    Harness { backend, notices, state }
}

fn aisha() -> SignupDetails {
    SignupDetails {
        name: "Aisha".into(),
        email: "aisha@example.com".into(),
        password: "sabr-and-shukr".into(),
        country: "Indonesia".into(),
        gender: Gender::Female,
        dob: "1998-07-21".into(),
    }
}

#[tokio::test]
async fn signup_writes_profile_and_signs_in() {
    let h = harness();
    let session = h.state.session();

    let user = session.signup(aisha()).await.unwrap();
    assert_eq!(user.name, "Aisha");
    assert_eq!(user.gender, Gender::Female);
    assert_eq!(session.state(), SessionState::SignedIn(user.clone()));

    let raw = h.backend.get_profile(&user.id).await.unwrap().unwrap();
    let doc = ProfileDoc::decode(&raw).unwrap();
    assert_eq!(doc.email, "aisha@example.com");
    assert_eq!(doc.country, "Indonesia");
    assert_eq!(doc.dob, "1998-07-21");

    let notices = h.notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Signup Successful");
    assert!(!notices[0].is_error());
}

#[tokio::test]
async fn signup_validation_happens_before_any_write() {
    let h = harness();
    let session = h.state.session();

    let cases = [
        SignupDetails { name: "A".into(), ..aisha() },
        SignupDetails { email: "aisha@".into(), ..aisha() },
        SignupDetails { password: "short".into(), ..aisha() },
        SignupDetails { country: " ".into(), ..aisha() },
        SignupDetails { dob: "2099-01-01".into(), ..aisha() },
        SignupDetails { dob: "".into(), ..aisha() },
    ];
    for details in cases {
        let err = session.signup(details.clone()).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "VALIDATION", "{details:?}");
    }

    assert!(h.backend.sign_in("aisha@example.com", "sabr-and-shukr").await.is_err());
    assert!(h.notices.drain().is_empty());
}

#[tokio::test]
async fn duplicate_account_gets_generic_notice() {
    let h = harness();
    let session = h.state.session();
    session.signup(aisha()).await.unwrap();
    h.notices.drain();

    let again = SignupDetails { email: "AISHA@example.com".into(), ..aisha() };
    let err = session.signup(again).await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "AUTH_FAILED");

    let notices = h.notices.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Signup Failed");
    assert_eq!(
        notices[0].description,
        "An account with this email already exists or another error occurred."
    );
}

#[tokio::test]
async fn login_failure_is_generic() {
    let h = harness();
    let session = h.state.session();
    session.signup(aisha()).await.unwrap();
    session.logout().await.unwrap();
    h.notices.drain();

    let wrong_pw = session.login("aisha@example.com", "nope-nope").await.unwrap_err();
    let no_user = session.login("nobody@example.com", "whatever1").await.unwrap_err();
    assert_eq!(wrong_pw.client_code(), no_user.client_code());
    assert_eq!(wrong_pw.client_code().as_str(), "AUTH_FAILED");
    assert_eq!(session.state(), SessionState::SignedOut);

    let notices = h.notices.drain();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.title == "Login Failed"));
    assert_eq!(notices[0].description, notices[1].description);
    assert_eq!(h.state.metrics().auth_failures.get(&[("op", "login")]), 2);
}

#[tokio::test]
async fn logout_then_login_restores_same_user() {
    let h = harness();
    let session = h.state.session();
    let user = session.signup(aisha()).await.unwrap();

    session.logout().await.unwrap();
    assert_eq!(session.state(), SessionState::SignedOut);
    assert!(session.current_user().is_none());

    let back = session.login("aisha@example.com", "sabr-and-shukr").await.unwrap();
    assert_eq!(back, user);
}

#[tokio::test]
async fn listener_follows_auth_state() {
    let h = harness();
    let session = h.state.session();
    assert_eq!(session.state(), SessionState::Loading);

    let mut rx = session.subscribe();
    session.start();
    session.start();
    timeout(Duration::from_secs(5), rx.wait_for(|s| *s == SessionState::SignedOut))
        .await
        .unwrap()
        .unwrap();

    // sign in directly at the provider; the listener loads the profile
    let user = session.signup(aisha()).await.unwrap();
    h.backend.sign_out().await.unwrap();
    timeout(Duration::from_secs(5), rx.wait_for(|s| *s == SessionState::SignedOut))
        .await
        .unwrap()
        .unwrap();

    h.backend.sign_in("aisha@example.com", "sabr-and-shukr").await.unwrap();
    timeout(Duration::from_secs(5), rx.wait_for(|s| s.user() == Some(&user)))
        .await
        .unwrap()
        .unwrap();

    session.stop();
}

#[tokio::test]
async fn account_without_profile_stays_signed_out() {
    let h = harness();
    let session = h.state.session();

    h.backend.fail_next_profile_writes(1);
    let err = session.signup(aisha()).await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "AUTH_FAILED");
    assert!(session.current_user().is_none());

    // the account exists but has no profile document
    h.notices.drain();
    let err = session.login("aisha@example.com", "sabr-and-shukr").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "AUTH_FAILED");
    assert_eq!(h.notices.drain()[0].title, "Login Failed");
}

#[tokio::test]
async fn profile_update_merges_into_cached_user() {
    let h = harness();
    let session = h.state.session();
    let user = session.signup(aisha()).await.unwrap();
    h.notices.drain();

    let updated = session
        .update_profile(ProfileUpdate { name: Some("Aisha R.".into()), country: None })
        .await
        .unwrap();
    assert_eq!(updated.name, "Aisha R.");
    assert_eq!(updated.country, "Indonesia");
    assert_eq!(session.current_user(), Some(updated));

    let raw = h.backend.get_profile(&user.id).await.unwrap().unwrap();
    assert_eq!(ProfileDoc::decode(&raw).unwrap().name, "Aisha R.");
    assert_eq!(h.notices.drain()[0].title, "Profile Updated");
}

#[tokio::test]
async fn profile_update_failure_is_visible() {
    let h = harness();
    let session = h.state.session();
    let user = session.signup(aisha()).await.unwrap();
    h.notices.drain();

    let err = session
        .update_profile(ProfileUpdate { name: Some("A".into()), country: None })
        .await
        .unwrap_err();
    assert_eq!(err.client_code().as_str(), "VALIDATION");

    h.backend.fail_next_profile_writes(1);
    let err = session
        .update_profile(ProfileUpdate { name: None, country: Some("Malaysia".into()) })
        .await
        .unwrap_err();
    assert_eq!(err.client_code().as_str(), "BACKEND");
    assert_eq!(session.current_user(), Some(user));
    assert_eq!(h.state.metrics().profile_update_failures.get(&[]), 1);

    let notices = h.notices.drain();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].is_error());
    assert_eq!(notices[0].title, "Profile Not Saved");
}

#[tokio::test]
async fn update_requires_session() {
    let h = harness();
    let err = h
        .state
        .session()
        .update_profile(ProfileUpdate { name: Some("Musa".into()), country: None })
        .await
        .unwrap_err();
    assert_eq!(err.client_code().as_str(), "AUTH_FAILED");
}

#[tokio::test]
async fn password_reset_notices() {
    let h = harness();
    let session = h.state.session();
    session.signup(aisha()).await.unwrap();
    h.notices.drain();

    session.send_password_reset("aisha@example.com").await.unwrap();
    assert_eq!(h.backend.reset_requests("aisha@example.com"), 1);
    assert_eq!(h.notices.drain()[0].title, "Password Reset Email Sent");

    let err = session.send_password_reset("ghost@example.com").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "NOT_FOUND");
    let notices = h.notices.drain();
    assert!(notices[0].is_error());
    assert_eq!(
        notices[0].description,
        "Could not send password reset email. Please try again."
    );

    let err = session.send_password_reset("not-an-email").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "VALIDATION");
}

#[tokio::test]
async fn dropping_all_owners_releases_session_and_backends() {
    let h = harness();
    let session = h.state.session();
    session.start();

    let mut rx = session.subscribe();
    timeout(Duration::from_secs(5), rx.wait_for(|s| *s == SessionState::SignedOut))
        .await
        .unwrap()
        .unwrap();

    let weak = Arc::downgrade(&session);
    drop(rx);
    drop(session);
    drop(h.state);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(weak.upgrade().is_none());
    assert_eq!(Arc::strong_count(&h.backend), 1);
}

#[tokio::test]
async fn login_without_profile_signs_provider_out() {
    let h = harness();
    let session = h.state.session();

    h.backend.create_account("bilal@example.com", "adhan-at-dawn").await.unwrap();
    h.backend.sign_out().await.unwrap();

    let err = session.login("bilal@example.com", "adhan-at-dawn").await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "AUTH_FAILED");
    assert_eq!(session.state(), SessionState::Loading);
    assert!(h.backend.auth_state().borrow().is_none());
}
