//! HTTP clients for the downstream services.

use super::{
    AudioService, AudioServiceResult, ChunkingResult, ChunkingService, LlmKind, LlmService,
    UpstreamService,
};
use crate::config::ServiceSettings;
use crate::error::{PodsumError, Result};
use crate::preprocess::ProcessedChunks;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 200;

/// One `reqwest` client serving all three downstream services.
///
/// No retries happen here; every call is a single bounded round-trip.
pub struct HttpServiceClient {
    client: reqwest::Client,
    audio_url: String,
    chunking_url: String,
    llm_url: String,
}

impl HttpServiceClient {
    /// Build a client from service settings.
    pub fn from_settings(settings: &ServiceSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| PodsumError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, settings))
    }

    /// Use an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client, settings: &ServiceSettings) -> Self {
        Self {
            client,
            audio_url: settings.audio_url.clone(),
            chunking_url: settings.chunking_url.clone(),
            llm_url: settings.llm_url.clone(),
        }
    }

    async fn post_json<B>(
        &self,
        base: &str,
        path: &str,
        body: &B,
        service: UpstreamService,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = join_url(base, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "failed" };
                PodsumError::upstream(service, format!("request to {} {}: {}", url, reason, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PodsumError::upstream(
                service,
                format!("{} returned {}: {}", url, status, truncate(&text, MAX_ERROR_BODY)),
            ));
        }

        let value = response.json::<Value>().await.map_err(|e| {
            PodsumError::upstream(service, format!("malformed response body from {}: {}", url, e))
        })?;

        debug!("{} responded with {} status", url, status);
        Ok(value)
    }
}

#[async_trait]
impl AudioService for HttpServiceClient {
    #[instrument(skip(self))]
    async fn call_audio_service(&self, audio_url: &str) -> Result<AudioServiceResult> {
        if audio_url.trim().is_empty() {
            return Err(PodsumError::Validation("audio_url is empty".to_string()));
        }

        let body = json!({ "url": audio_url });
        let payload = self
            .post_json(&self.audio_url, "transcript", &body, UpstreamService::Audio)
            .await?;
        AudioServiceResult::from_response(payload)
    }
}

#[async_trait]
impl ChunkingService for HttpServiceClient {
    #[instrument(skip_all)]
    async fn call_chunking_service(&self, audio: &AudioServiceResult) -> Result<ChunkingResult> {
        let value = self
            .post_json(
                &self.chunking_url,
                "call_chunking",
                audio.payload(),
                UpstreamService::Chunking,
            )
            .await?;
        Ok(ChunkingResult::new(value))
    }
}

#[async_trait]
impl LlmService for HttpServiceClient {
    #[instrument(skip(self, chunks), fields(chunks = chunks.chunks.len()))]
    async fn call_llm_service(&self, kind: LlmKind, chunks: &ProcessedChunks) -> Result<Value> {
        self.post_json(&self.llm_url, kind.as_str(), chunks, UpstreamService::Llm(kind))
            .await
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn truncate(text: &str, max_len: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
