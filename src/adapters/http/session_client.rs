//! HTTP Session Client - reqwest implementation of the SessionService port.
//!
//! Talks to the remote questionnaire session over REST with a bearer
//! credential from the auth provider. Idempotent reads retry transient
//! failures with a short backoff; writes are delivered once and left to the
//! engine's pending-batch machinery on failure.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpSessionConfig::new("https://api.nestquest.example/questionnaire")
//!     .with_timeout(Duration::from_secs(30))
//!     .with_max_retries(2);
//!
//! let service = HttpSessionService::new(config, auth_provider);
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AnswerMap, AuthProvider, RemoteFlowState, RemoteResponses, SessionService,
    SessionServiceError,
};

/// Base delay between retry attempts; grows linearly per attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Configuration for the HTTP session client.
#[derive(Debug, Clone)]
pub struct HttpSessionConfig {
    /// Base URL of the questionnaire session resource.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for idempotent reads.
    pub max_retries: u32,
}

impl HttpSessionConfig {
    /// Creates a configuration with default timeout and retries.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count for reads.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Serialize)]
struct AnswersEnvelope<'a> {
    answers: &'a AnswerMap,
}

/// SessionService implementation over REST.
pub struct HttpSessionService {
    config: HttpSessionConfig,
    client: Client,
    auth: Arc<dyn AuthProvider>,
}

impl HttpSessionService {
    /// Creates a client with the given configuration and credentials.
    pub fn new(config: HttpSessionConfig, auth: Arc<dyn AuthProvider>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Maps a response status onto the port error taxonomy.
    fn check_status(status: StatusCode) -> Result<(), SessionServiceError> {
        if status.is_success() {
            return Ok(());
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SessionServiceError::Auth),
            StatusCode::CONFLICT => Err(SessionServiceError::Conflict),
            other => Err(SessionServiceError::Status(other.as_u16())),
        }
    }

    /// True for failures worth retrying on an idempotent read.
    fn is_transient(error: &SessionServiceError) -> bool {
        match error {
            SessionServiceError::Transport(_) => true,
            SessionServiceError::Status(code) => *code >= 500,
            _ => false,
        }
    }

    async fn authorized(
        &self,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, SessionServiceError> {
        let token = self
            .auth
            .bearer_token()
            .await
            .map_err(|_| SessionServiceError::Auth)?;
        Ok(builder.bearer_auth(token.expose_secret()))
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, SessionServiceError> {
        let response = builder
            .send()
            .await
            .map_err(|e| SessionServiceError::Transport(e.to_string()))?;
        Self::check_status(response.status())?;
        response
            .json::<T>()
            .await
            .map_err(|e| SessionServiceError::InvalidResponse(e.to_string()))
    }

    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, SessionServiceError> {
        let mut attempt = 0;
        loop {
            let builder = self.authorized(self.client.get(self.url(path))).await?;
            match self.execute(builder).await {
                Ok(value) => return Ok(value),
                Err(error)
                    if Self::is_transient(&error) && attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    tracing::debug!(path, attempt, %error, "retrying session service read");
                    sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl SessionService for HttpSessionService {
    async fn fetch_current(&self) -> Result<RemoteFlowState, SessionServiceError> {
        self.get_with_retry("current").await
    }

    async fn submit_answers(
        &self,
        answers: &AnswerMap,
    ) -> Result<RemoteFlowState, SessionServiceError> {
        let builder = self
            .authorized(self.client.post(self.url("answers")))
            .await?
            .json(&AnswersEnvelope { answers });
        self.execute(builder).await
    }

    async fn previous_question(&self) -> Result<RemoteFlowState, SessionServiceError> {
        let builder = self
            .authorized(self.client.post(self.url("current/previous")))
            .await?;
        self.execute(builder).await
    }

    async fn finalize(&self) -> Result<(), SessionServiceError> {
        let builder = self
            .authorized(self.client.put(format!("{}/", self.config.base_url)))
            .await?;
        let response = builder
            .send()
            .await
            .map_err(|e| SessionServiceError::Transport(e.to_string()))?;
        Self::check_status(response.status())
    }

    async fn fetch_responses(&self) -> Result<RemoteResponses, SessionServiceError> {
        self.get_with_retry("responses").await
    }
}

impl std::fmt::Debug for HttpSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSessionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::StaticAuthProvider;
    use crate::domain::foundation::UserId;

    fn service(base_url: &str) -> HttpSessionService {
        HttpSessionService::new(
            HttpSessionConfig::new(base_url),
            Arc::new(StaticAuthProvider::new(
                UserId::new("user-123").unwrap(),
                "token",
            )),
        )
    }

    #[test]
    fn config_defaults_are_sane() {
        let config = HttpSessionConfig::new("https://api.example/questionnaire");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let service = service("https://api.example/questionnaire/");
        assert_eq!(
            service.url("current"),
            "https://api.example/questionnaire/current"
        );
        assert_eq!(
            service.url("/current/previous"),
            "https://api.example/questionnaire/current/previous"
        );
    }

    #[test]
    fn status_mapping_covers_the_error_taxonomy() {
        assert!(HttpSessionService::check_status(StatusCode::OK).is_ok());
        assert!(HttpSessionService::check_status(StatusCode::NO_CONTENT).is_ok());
        assert!(matches!(
            HttpSessionService::check_status(StatusCode::UNAUTHORIZED),
            Err(SessionServiceError::Auth)
        ));
        assert!(matches!(
            HttpSessionService::check_status(StatusCode::FORBIDDEN),
            Err(SessionServiceError::Auth)
        ));
        assert!(matches!(
            HttpSessionService::check_status(StatusCode::CONFLICT),
            Err(SessionServiceError::Conflict)
        ));
        assert!(matches!(
            HttpSessionService::check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(SessionServiceError::Status(500))
        ));
    }

    #[test]
    fn only_transport_and_server_errors_are_transient() {
        assert!(HttpSessionService::is_transient(
            &SessionServiceError::Transport("reset".to_string())
        ));
        assert!(HttpSessionService::is_transient(&SessionServiceError::Status(503)));
        assert!(!HttpSessionService::is_transient(&SessionServiceError::Status(404)));
        assert!(!HttpSessionService::is_transient(&SessionServiceError::Auth));
        assert!(!HttpSessionService::is_transient(&SessionServiceError::Conflict));
    }
}
