//! Authentication API.

use super::endpoints;
use crate::client::TtkiaClient;
use crate::error::{Error, Result};
use crate::types::{SessionInfo, UserProfile};

/// Authentication API client.
pub struct AuthApi {
    client: TtkiaClient,
}

impl AuthApi {
    pub(crate) fn new(client: TtkiaClient) -> Self {
        Self { client }
    }

    /// Fetch the authenticated user's profile.
    pub async fn me(&self) -> Result<UserProfile> {
        self.client.get(endpoints::USER_ME).await
    }

    /// Whether the configured token is accepted.
    ///
    /// Never fails: any error counts as "not authenticated". Without a token
    /// no request is made.
    pub async fn is_authenticated(&self) -> bool {
        if !self.client.has_token() {
            return false;
        }

        match self.client.get::<serde_json::Value>(endpoints::USER_ME).await {
            Ok(_) => true,
            Err(e) if e.is_auth_error() => {
                tracing::warn!(status = e.status(), "Token is invalid or expired");
                false
            }
            Err(Error::Api { status, .. }) => {
                tracing::warn!(status, "Authentication failed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Authentication check failed");
                false
            }
        }
    }

    /// Summarize the session, including a live authentication check.
    pub async fn session_info(&self) -> SessionInfo {
        SessionInfo {
            authenticated: self.is_authenticated().await,
            base_url: self.client.base_url().to_string(),
            app_token_present: self.client.has_token(),
            timeout_secs: self.client.timeout().as_secs(),
        }
    }
}
