pub mod service;

pub use service::AuthService;

use serde::Deserialize;
use tokio::sync::watch;

/// Credentials for the logged-in user, as issued by the authentication
/// endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub id: i64,
    pub token: String,
}

/// Holder of the current identity. Constructed once at startup and passed
/// down explicitly; subscribers get the latest value immediately and then
/// every change.
pub struct AppAuth {
    data: watch::Sender<Option<AuthToken>>,
}

impl AppAuth {
    pub fn new() -> Self {
        let (data, _) = watch::channel(None);
        Self { data }
    }

    pub fn set_token(&self, id: i64, token: String) {
        tracing::info!(user_id = id, "auth token set");
        self.data.send_replace(Some(AuthToken { id, token }));
    }

    pub fn clear_auth(&self) {
        tracing::info!("auth cleared");
        self.data.send_replace(None);
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.data.borrow().clone()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.data.borrow().as_ref().map(|token| token.id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthToken>> {
        self.data.subscribe()
    }
}

impl Default for AppAuth {
    fn default() -> Self {
        Self::new()
    }
}
