//! Credentials for external APIs.
//!
//! Clients receive a [`TokenProvider`] instead of reading a process-wide token.

use super::SourceError;

#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, SourceError>;
}

/// Fixed API token (Kaspi shop tokens do not expire).
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, SourceError> {
        if self.0.trim().is_empty() {
            return Err(SourceError::Auth("no API token configured".to_string()));
        }
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned_as_configured() {
        assert_eq!(StaticToken::new("kaspi-abc").token().await.unwrap(), "kaspi-abc");
    }

    #[tokio::test]
    async fn empty_static_token_is_auth_error() {
        match StaticToken::new("  ").token().await {
            Err(SourceError::Auth(_)) => {}
            other => panic!("expected Auth, got {other:?}"),
        }
    }
}
