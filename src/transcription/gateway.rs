use crate::config::TranscriptionConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// The provider answered with an error payload or no usable text. The
    /// message is carried verbatim for diagnostic display.
    #[error("{0}")]
    Provider(String),

    /// The provider could not be reached at all.
    #[error("transcription request failed: {0}")]
    Transport(String),
}

/// Speech-to-text boundary: hand over a time-limited fetchable URL, get
/// transcript text back. Consumed as a black-box capability.
#[async_trait]
pub trait TranscriptionGateway: Send + Sync {
    async fn transcribe(&self, audio_url: &str) -> Result<String, TranscriptionError>;
}

/// Client for the transcription relay endpoint.
///
/// The relay accepts `{ "audioUrl": ... }` plus policy options and answers
/// `{ "text": ... }` on success or `{ "error": ... }` with a non-2xx
/// status. Model preference is a provider-side concern: we request the
/// high-accuracy tier with an explicit fallback, never retry locally.
pub struct HttpTranscriptionGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    primary_model: String,
    fallback_model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest<'a> {
    audio_url: &'a str,
    detect_language: bool,
    model: &'a str,
    fallback_model: &'a str,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    text: Option<String>,
    error: Option<String>,
}

impl HttpTranscriptionGateway {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        primary_model: String,
        fallback_model: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            primary_model,
            fallback_model,
        }
    }

    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.primary_model.clone(),
            config.fallback_model.clone(),
        )
    }
}

#[async_trait]
impl TranscriptionGateway for HttpTranscriptionGateway {
    async fn transcribe(&self, audio_url: &str) -> Result<String, TranscriptionError> {
        debug!("submitting media to transcription relay ({})", self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(&RelayRequest {
            audio_url,
            detect_language: true,
            model: &self.primary_model,
            fallback_model: &self.fallback_model,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;
        let status = response.status();
        let body: RelayResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(TranscriptionError::Provider(
                body.error
                    .unwrap_or_else(|| format!("provider returned status {status}")),
            ));
        }

        match body.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(TranscriptionError::Provider(
                "provider returned no usable text".to_string(),
            )),
        }
    }
}
