//! UmmahConnect demo client
//!
//! Runs a short scripted session against the in-process backend:
//! - sign up, open a channel, post, wait for the live snapshot
//! - try a restricted channel
//! - log out and dump metrics

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use ummah_client::app_state::AppState;
use ummah_client::backend::MemoryBackend;
use ummah_client::chat::ChatView;
use ummah_client::config::{self, ClientConfig};
use ummah_client::notice::NoticeLog;
use ummah_client::router::{self, ChannelRoute};
use ummah_client::session::SignupDetails;
use ummah_core::error::{Result, UmmahError};
use ummah_core::Gender;

const CONFIG_PATH: &str = "ummah.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH)?
    } else {
        ClientConfig::default()
    };

    let backend = Arc::new(MemoryBackend::new());
    let notices = Arc::new(NoticeLog::new());
    let state = AppState::with_memory_backend(cfg, backend, notices.clone())?;
    let session = state.session();
    session.start();

    let user = session
        .signup(SignupDetails {
            name: "Yusuf".into(),
            email: "yusuf@example.com".into(),
            password: "bismillah123".into(),
            country: "Morocco".into(),
            gender: Gender::Male,
            dob: "1994-03-02".into(),
        })
        .await?;
    tracing::info!(uid = %user.id, name = %user.display_name(), "demo user ready");

    for entry in router::sidebar(&user, router::DEFAULT_CHANNEL) {
        tracing::info!(href = %entry.href, tooltip = %entry.tooltip, allowed = entry.allowed, active = entry.active, "sidebar");
    }

    let mut chat = ChatView::new(state.clone());
    chat.open("islam-chat").await?;
    let mut snapshots = chat
        .feed()
        .ok_or_else(|| UmmahError::Internal("feed not started".into()))?
        .snapshots();

    chat.set_draft("Peace be upon you");
    chat.submit().await?;

    let wait = async {
        loop {
            if snapshots.changed().await.is_err() {
                break;
            }
            if !snapshots.borrow().messages.is_empty() {
                break;
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(2), wait).await.is_err() {
        tracing::warn!("no snapshot received");
    }
    for m in chat.visible_messages() {
        tracing::info!(author = %m.author.name, text = %m.text, ts = ?m.timestamp, "message");
    }

    match chat.open("sisters-section").await? {
        ChannelRoute::AccessDenied(c) => tracing::info!(channel = c.id, "access denied as expected"),
        other => tracing::warn!(?other, "unexpected route"),
    }

    chat.close().await;
    session.logout().await?;
    session.stop();

    for n in notices.drain() {
        tracing::info!(title = %n.title, desc = %n.description, "notice");
    }
    print!("{}", state.metrics().render());
    Ok(())
}
