//! Session context: who is signed in, and the account/profile operations.
//!
//! Replaces ambient global user state with an explicit context. The state is
//! `Loading` until the first auth-state callback has been resolved, then
//! follows the identity provider: a session with a profile document is
//! `SignedIn`, anything else is `SignedOut`.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ummah_core::document::{ProfileDoc, ProfileUpdate};
use ummah_core::error::{Result, UmmahError};
use ummah_core::validate;
use ummah_core::{Gender, User};

use crate::backend::{AuthSession, IdentityProvider, ProfileStore};
use crate::config::{ProfileSection, SignupSection};
use crate::notice::{Notice, NoticeSink};
use crate::obs::ClientMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    SignedOut,
    SignedIn(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::SignedIn(u) => Some(u),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Signup form.
#[derive(Debug, Clone)]
pub struct SignupDetails {
    pub name: String,
    pub email: String,
    pub password: String,
    pub country: String,
    pub gender: Gender,
    /// Plain date or RFC 3339 timestamp.
    pub dob: String,
}

pub struct Session {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    signup_cfg: SignupSection,
    profile_cfg: ProfileSection,
    notices: Arc<dyn NoticeSink>,
    metrics: Arc<ClientMetrics>,
    state: watch::Sender<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        signup_cfg: SignupSection,
        profile_cfg: ProfileSection,
        notices: Arc<dyn NoticeSink>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            identity,
            profiles,
            signup_cfg,
            profile_cfg,
            notices,
            metrics,
            state,
            listener: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Follow auth-state changes until `stop` or until the session is dropped.
    /// Calling twice is a no-op. The task only holds a weak reference.
    pub fn start(self: &Arc<Self>) {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut rx = self.identity.auth_state();
        *slot = Some(tokio::spawn(async move {
            loop {
                let current = rx.borrow_and_update().clone();
                {
                    let Some(this) = weak.upgrade() else {
                        break;
                    };
                    this.resolve(current).await;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
            debug!("session listener exited");
        }));
        info!("session listening for auth state");
    }

    /// Tear down the auth-state listener.
    pub fn stop(&self) {
        if let Some(h) = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            h.abort();
            debug!("session listener stopped");
        }
    }

    async fn resolve(&self, auth: Option<AuthSession>) {
        let Some(auth) = auth else {
            self.state.send_replace(SessionState::SignedOut);
            return;
        };
        match self.load_user(&auth.uid).await {
            Ok(user) => {
                self.state.send_replace(SessionState::SignedIn(user));
            }
            Err(e) => {
                warn!(uid = %auth.uid, error = %e, "signed in without a usable profile");
                // signup may have finished writing the profile meanwhile
                self.state.send_if_modified(|s| match s {
                    SessionState::SignedIn(u) if u.id == auth.uid => false,
                    _ => {
                        *s = SessionState::SignedOut;
                        true
                    }
                });
            }
        }
    }

    async fn load_user(&self, uid: &str) -> Result<User> {
        let raw = self
            .profiles
            .get_profile(uid)
            .await?
            .ok_or_else(|| UmmahError::NotFound(format!("profile {uid}")))?;
        Ok(ProfileDoc::decode(&raw)?.into_user(uid))
    }

    fn auth_failed(&self, op: &'static str, title: &str, description: &str, e: &UmmahError) {
        warn!(op, error = %e, "auth operation failed");
        self.metrics.auth_failures.inc(&[("op", op)]);
        self.notices.push(Notice::error(title, description));
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let res = async {
            let auth = self.identity.sign_in(email, password).await?;
            match self.load_user(&auth.uid).await {
                Ok(user) => Ok(user),
                Err(e) => {
                    // no profile: do not leave the provider signed in
                    if let Err(out) = self.identity.sign_out().await {
                        warn!(uid = %auth.uid, error = %out, "sign out after failed login failed");
                    }
                    Err(e)
                }
            }
        }
        .await;

        match res {
            Ok(user) => {
                info!(uid = %user.id, "logged in");
                self.state.send_replace(SessionState::SignedIn(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.auth_failed("login", "Login Failed", "Invalid email or password.", &e);
                Err(UmmahError::AuthFailed)
            }
        }
    }

    /// Validate, create the account, write the profile document and sign in.
    /// Validation errors are returned for the form; backend failures produce
    /// a generic notice.
    pub async fn signup(&self, details: SignupDetails) -> Result<User> {
        let today = chrono::Utc::now().date_naive();
        validate::validate_name(&details.name, self.profile_cfg.min_name_len)?;
        validate::validate_email(&details.email)?;
        validate::validate_password(&details.password, self.signup_cfg.min_password_len)?;
        validate::validate_country(&details.country)?;
        validate::validate_dob(&details.dob, self.signup_cfg.min_age_years, today)?;

        let res = async {
            let auth = self
                .identity
                .create_account(&details.email, &details.password)
                .await?;
            let doc = ProfileDoc {
                email: auth.email.clone(),
                name: details.name.trim().to_string(),
                country: details.country.clone(),
                gender: details.gender,
                dob: details.dob.clone(),
            };
            self.profiles.create_profile(&auth.uid, &doc).await?;
            self.load_user(&auth.uid).await
        }
        .await;

        match res {
            Ok(user) => {
                info!(uid = %user.id, "account created");
                self.state.send_replace(SessionState::SignedIn(user.clone()));
                self.notices
                    .push(Notice::info("Signup Successful", "Your account has been created."));
                Ok(user)
            }
            Err(e) => {
                self.auth_failed(
                    "signup",
                    "Signup Failed",
                    "An account with this email already exists or another error occurred.",
                    &e,
                );
                Err(UmmahError::AuthFailed)
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.identity.sign_out().await {
            self.auth_failed("logout", "Logout Failed", "Please try again.", &e);
            return Err(e);
        }
        self.state.send_replace(SessionState::SignedOut);
        info!("logged out");
        Ok(())
    }

    /// Partial update of name and/or country. Failures are user-visible.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let user = self.current_user().ok_or(UmmahError::AuthFailed)?;

        if let Some(n) = &update.name {
            validate::validate_name(n, self.profile_cfg.min_name_len)?;
        }
        if let Some(c) = &update.country {
            validate::validate_country(c)?;
        }
        if update.is_empty() {
            return Ok(user);
        }

        if let Err(e) = self.profiles.update_profile(&user.id, &update).await {
            warn!(uid = %user.id, error = %e, "profile update failed");
            self.metrics.profile_update_failures.inc(&[]);
            self.notices.push(Notice::error(
                "Profile Not Saved",
                "Your changes could not be saved. Please try again.",
            ));
            return Err(e);
        }

        self.state.send_modify(|s| {
            if let SessionState::SignedIn(u) = s {
                if u.id == user.id {
                    update.apply_to(u);
                }
            }
        });
        self.notices.push(Notice::info(
            "Profile Updated",
            "Your information has been successfully saved.",
        ));
        self.current_user().ok_or(UmmahError::AuthFailed)
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        validate::validate_email(email)?;
        match self.identity.send_password_reset(email).await {
            Ok(()) => {
                self.notices.push(Notice::info(
                    "Password Reset Email Sent",
                    "Please check your email for instructions to reset your password.",
                ));
                Ok(())
            }
            Err(e) => {
                self.auth_failed(
                    "password_reset",
                    "Error",
                    "Could not send password reset email. Please try again.",
                    &e,
                );
                Err(e)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}
