use crate::error::AuthError;
use async_trait::async_trait;

/// Supplies bearer tokens for the Google APIs.
///
/// Acquiring and refreshing tokens happens outside of this crate; providers
/// only hand out what they were given.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// A token resolved once at startup, e.g. from an environment variable.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: Option<String>,
    source: String,
}

impl StaticTokenProvider {
    /// `source` names where the token came from and is used in error messages.
    pub fn new(token: Option<String>, source: impl Into<String>) -> Self {
        StaticTokenProvider {
            token: token.filter(|t| !t.trim().is_empty()),
            source: source.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.token
            .clone()
            .ok_or_else(|| AuthError::Missing(self.source.clone()))
    }
}
