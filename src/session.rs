//! The login flag.
//!
//! There is no real authentication: a user is logged in when a session
//! payload is stored under [`SESSION_KEY`].

use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

use crate::framework::BlobStore;

/// Blob key the session payload is persisted under.
pub const SESSION_KEY: &str = "currentUser";

/// Shown when no user name is known.
pub const DEFAULT_DISPLAY_NAME: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

pub struct Session {
    blob: Arc<dyn BlobStore>,
    user: Option<String>,
}

impl Session {
    /// Restores the stored session. A payload that is not valid JSON is
    /// removed and the session starts logged out.
    pub async fn load(blob: Arc<dyn BlobStore>) -> io::Result<Self> {
        let user = match blob.get(SESSION_KEY).await? {
            None => None,
            Some(raw) => match serde_json::from_str::<SessionPayload>(&raw) {
                Ok(payload) => payload.username.filter(|name| !name.is_empty()),
                Err(e) => {
                    warn!(error = %e, "Corrupt session payload, clearing");
                    blob.remove(SESSION_KEY).await?;
                    None
                }
            },
        };
        Ok(Self { blob, user })
    }

    pub async fn login(&mut self, username: &str) -> io::Result<()> {
        let payload = SessionPayload {
            username: Some(username.to_string()),
        };
        let raw = serde_json::to_string(&payload).map_err(io::Error::other)?;
        self.blob.set(SESSION_KEY, &raw).await?;
        self.user = Some(username.to_string());
        info!(username, "Logged in");
        Ok(())
    }

    pub async fn logout(&mut self) -> io::Result<()> {
        self.blob.remove(SESSION_KEY).await?;
        if let Some(username) = self.user.take() {
            info!(%username, "Logged out");
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.user.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}
