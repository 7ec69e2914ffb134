//! Auth provider port - opaque bearer credentials and user identity.
//!
//! Token issuance and refresh happen behind this port; the engine only ever
//! sees a ready-to-use credential and a stable user id for cache scoping.

use async_trait::async_trait;
use secrecy::Secret;

use crate::domain::foundation::{EngineError, UserId};

/// Errors that can occur obtaining credentials.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("no authenticated user")]
    NotAuthenticated,

    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for EngineError {
    fn from(_: AuthError) -> Self {
        EngineError::Auth
    }
}

/// Port for the authentication provider.
///
/// # Contract
///
/// Implementations must:
/// - Return the same `UserId` for the lifetime of a login session
/// - Refresh expired tokens transparently where the backing provider
///   supports it; `bearer_token` returns a credential that is valid now
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The stable identifier of the authenticated user.
    async fn current_user(&self) -> Result<UserId, AuthError>;

    /// A bearer credential for the session service.
    async fn bearer_token(&self) -> Result<Secret<String>, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_collapse_into_the_auth_variant() {
        let err: EngineError = AuthError::NotAuthenticated.into();
        assert_eq!(err, EngineError::Auth);
        let err: EngineError = AuthError::Unavailable("down".to_string()).into();
        assert_eq!(err, EngineError::Auth);
    }
}
