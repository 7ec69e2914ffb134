//! Static Auth Provider Adapter
//!
//! Serves a fixed user id and bearer token from configuration. The real
//! deployment swaps this for the platform's OIDC-backed provider; the engine
//! only ever sees the port.

use async_trait::async_trait;
use secrecy::Secret;

use crate::domain::foundation::UserId;
use crate::ports::{AuthError, AuthProvider};

/// Auth provider backed by configuration values.
pub struct StaticAuthProvider {
    user_id: UserId,
    token: Secret<String>,
}

impl StaticAuthProvider {
    /// Creates a provider for a fixed user and token.
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self {
            user_id,
            token: Secret::new(token.into()),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    async fn current_user(&self) -> Result<UserId, AuthError> {
        Ok(self.user_id.clone())
    }

    async fn bearer_token(&self) -> Result<Secret<String>, AuthError> {
        Ok(self.token.clone())
    }
}

impl std::fmt::Debug for StaticAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAuthProvider")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn serves_the_configured_identity() {
        let provider =
            StaticAuthProvider::new(UserId::new("user-123").unwrap(), "token-abc");

        let user = provider.current_user().await.unwrap();
        assert_eq!(user.as_str(), "user-123");

        let token = provider.bearer_token().await.unwrap();
        assert_eq!(token.expose_secret(), "token-abc");
    }

    #[test]
    fn debug_output_does_not_leak_the_token() {
        let provider =
            StaticAuthProvider::new(UserId::new("user-123").unwrap(), "token-abc");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("token-abc"));
    }
}
