//! The external natural-language capability: prompt text in, text out.
//!
//! Translators only ever see the [`Nlu`] trait, so tests substitute
//! deterministic stubs and deployments pick a provider. Every call goes
//! through [`call_bounded`], which caps it with a timeout and wraps the reply
//! in [`Tainted`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::secret::Secret;
use crate::Tainted;

/// Default bound on a single NLU call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport-level failure to get a reply from the NLU.
///
/// A reply that arrives but makes no sense is not an `NluError`; that is a
/// [`SanitizationError`](crate::SanitizationError) raised later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NluError {
    /// The call did not finish within the bound
    #[error("nlu call timed out after {0:?}")]
    Timeout(Duration),
    /// The provider could not be reached
    #[error("nlu transport error: {0}")]
    Transport(String),
    /// The provider answered with a non-success status
    #[error("nlu provider returned status {0}")]
    Status(u16),
    /// The provider's envelope held no text
    #[error("nlu provider returned no text")]
    EmptyReply,
}

/// A text-in, text-out natural-language capability.
#[async_trait]
pub trait Nlu: Send + Sync {
    /// Sends `prompt` and returns the provider's raw text reply.
    async fn translate_text(&self, prompt: &str) -> Result<String, NluError>;
}

/// Calls `nlu` with a timeout and marks the reply as tainted.
///
/// # Errors
///
/// Returns [`NluError::Timeout`] when `timeout` elapses first, or whatever
/// error the provider reported.
pub async fn call_bounded(
    nlu: &dyn Nlu,
    prompt: &str,
    timeout: Duration,
) -> Result<Tainted<String>, NluError> {
    match tokio::time::timeout(timeout, nlu.translate_text(prompt)).await {
        Ok(Ok(text)) => Ok(Tainted::new(text)),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(NluError::Timeout(timeout)),
    }
}

/// Connection settings for [`HttpNlu`].
pub struct HttpNluConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    /// Bearer key for the provider, if it needs one
    pub api_key: Option<Secret<String>>,
    /// Client-level request timeout
    pub timeout: Duration,
}

impl fmt::Debug for HttpNluConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNluConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// NLU provider speaking the OpenAI-compatible chat-completions protocol.
///
/// Sends the prompt as a single user message at temperature zero and returns
/// `choices[0].message.content`.
pub struct HttpNlu {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<Secret<String>>,
}

impl fmt::Debug for HttpNlu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNlu")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpNlu {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`NluError::Transport`] if the TLS backend cannot be set up.
    pub fn new(config: HttpNluConfig) -> Result<Self, NluError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NluError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            model: config.model,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl Nlu for HttpNlu {
    async fn translate_text(&self, prompt: &str) -> Result<String, NluError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NluError::Transport("request timed out".to_string())
            } else {
                NluError::Transport(e.without_url().to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NluError::Status(status.as_u16()));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| NluError::Transport(e.without_url().to_string()))?;

        let text = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(NluError::EmptyReply)?;

        debug!(chars = text.len(), "nlu reply received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingNlu, StaticNlu};

    #[tokio::test]
    async fn bounded_call_taints_the_reply() {
        let reply = call_bounded(&StaticNlu::new("[]"), "prompt", DEFAULT_TIMEOUT)
            .await
            .expect("reply");
        assert!(format!("{reply:?}").contains("Tainted"));
    }

    #[tokio::test]
    async fn bounded_call_passes_provider_errors_through() {
        let err = call_bounded(&FailingNlu, "prompt", DEFAULT_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, NluError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_call_times_out() {
        let slow = StaticNlu::new("[]").delayed(Duration::from_secs(60));
        let err = call_bounded(&slow, "prompt", Duration::from_secs(3))
            .await
            .unwrap_err();
        assert_eq!(err, NluError::Timeout(Duration::from_secs(3)));
    }

    #[test]
    fn chat_envelope_parses() {
        let envelope: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"[]"}}]}"#,
        )
        .expect("envelope");
        assert_eq!(envelope.choices[0].message.content.as_deref(), Some("[]"));
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let nlu = HttpNlu::new(HttpNluConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            model: "test-model".to_string(),
            api_key: Some(Secret::new("sk-live-123".to_string())),
            timeout: DEFAULT_TIMEOUT,
        })
        .expect("client builds");

        let out = format!("{nlu:?}");
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("sk-live-123"));
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let nlu = HttpNlu::new(HttpNluConfig {
            // Port 9 (discard) is closed on test machines.
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            timeout: Duration::from_secs(2),
        })
        .expect("client builds");

        let err = nlu.translate_text("prompt").await.unwrap_err();
        assert!(matches!(err, NluError::Transport(_)));
    }
}
