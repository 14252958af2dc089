use std::sync::Arc;

use crate::domain::auth::AppAuth;
use crate::error::AppResult;
use crate::infrastructure::api::PostApi;

/// Sign-in/sign-up flows. Successful calls publish the issued token through
/// [`AppAuth`], which the feed layer observes reactively.
pub struct AuthService {
    api: Arc<dyn PostApi>,
    auth: Arc<AppAuth>,
}

impl AuthService {
    pub fn new(api: Arc<dyn PostApi>, auth: Arc<AppAuth>) -> Self {
        Self { api, auth }
    }

    pub async fn sign_in(&self, login: &str, pass: &str) -> AppResult<()> {
        let token = self.api.sign_in(login, pass).await?;
        self.auth.set_token(token.id, token.token);
        Ok(())
    }

    pub async fn sign_up(&self, login: &str, pass: &str, name: &str) -> AppResult<()> {
        let token = self.api.sign_up(login, pass, name).await?;
        self.auth.set_token(token.id, token.token);
        Ok(())
    }

    pub fn sign_out(&self) {
        self.auth.clear_auth();
    }
}
