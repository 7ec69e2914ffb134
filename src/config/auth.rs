//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::StaticAuthProvider;
use crate::domain::foundation::UserId;

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Stable identifier of the authenticated user
    pub user_id: String,

    /// Opaque bearer token for the session service
    pub token: Secret<String>,
}

impl AuthConfig {
    /// The configured user as a domain id
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserId` if the configured value is empty.
    pub fn user(&self) -> Result<UserId, ValidationError> {
        UserId::new(self.user_id.clone()).map_err(|_| ValidationError::InvalidUserId)
    }

    /// Builds the static auth provider adapter
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserId` if the configured value is empty.
    pub fn provider(&self) -> Result<StaticAuthProvider, ValidationError> {
        Ok(StaticAuthProvider::new(
            self.user()?,
            self.token.expose_secret().clone(),
        ))
    }

    /// Validate auth configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_empty() {
            return Err(ValidationError::InvalidUserId);
        }
        if self.token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("auth.token"));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(user_id: &str, token: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            token: Secret::new(token.to_string()),
        }
    }
}
