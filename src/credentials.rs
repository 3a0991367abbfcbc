/// file: src/credentials.rs
/// description: bearer credential providers consulted by the auth handshake
use crate::error::{ChannelError, Result};
use async_trait::async_trait;

/// Shared, read-only source of access tokens. Channels fetch concurrently.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, typically from the command line.
#[derive(Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        self.token
            .clone()
            .ok_or_else(|| ChannelError::CredentialUnavailable("no access token configured".into()))
    }
}
