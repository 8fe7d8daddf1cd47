//! Downstream service contracts.
//!
//! Each downstream service (audio, chunking, LLM) sits behind a trait so the
//! orchestrator can be driven by the HTTP clients in production and by
//! substitutes in tests.

mod http;

pub use http::HttpServiceClient;

use crate::error::{PodsumError, Result};
use crate::preprocess::ProcessedChunks;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four analyses requested from the LLM service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmKind {
    Summary,
    Keywords,
    Highlights,
    Keypoints,
}

impl LlmKind {
    pub const ALL: [LlmKind; 4] = [
        LlmKind::Summary,
        LlmKind::Keywords,
        LlmKind::Highlights,
        LlmKind::Keypoints,
    ];

    /// Sub-endpoint path on the LLM service.
    pub fn as_str(self) -> &'static str {
        match self {
            LlmKind::Summary => "summary",
            LlmKind::Keywords => "keywords",
            LlmKind::Highlights => "highlights",
            LlmKind::Keypoints => "keypoints",
        }
    }
}

impl std::fmt::Display for LlmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies which remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamService {
    Audio,
    Chunking,
    Llm(LlmKind),
}

impl UpstreamService {
    /// Service name without the sub-kind.
    pub fn service(self) -> &'static str {
        match self {
            UpstreamService::Audio => "audio",
            UpstreamService::Chunking => "chunking",
            UpstreamService::Llm(_) => "llm",
        }
    }

    pub fn subkind(self) -> Option<LlmKind> {
        match self {
            UpstreamService::Llm(kind) => Some(kind),
            _ => None,
        }
    }
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.subkind() {
            Some(kind) => write!(f, "{}/{}", self.service(), kind),
            None => f.write_str(self.service()),
        }
    }
}

/// Episode metadata reported by the audio service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub title: String,
    /// Episode length in seconds.
    pub length: f64,
}

/// Audio service response: typed metadata plus the untouched body.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioServiceResult {
    pub metadata: EpisodeMetadata,
    payload: Value,
}

impl AudioServiceResult {
    /// Validate an audio service response body.
    ///
    /// The body must carry `results.metadata.title` (non-blank string) and
    /// `results.metadata.length` (non-negative number); anything else is
    /// passed through untouched.
    pub fn from_response(payload: Value) -> Result<Self> {
        let malformed = |msg: String| PodsumError::upstream(UpstreamService::Audio, msg);

        let raw = payload
            .pointer("/results/metadata")
            .ok_or_else(|| malformed("response has no results.metadata".to_string()))?;
        let metadata = EpisodeMetadata::deserialize(raw)
            .map_err(|e| malformed(format!("results.metadata is malformed: {}", e)))?;

        if metadata.title.trim().is_empty() {
            return Err(malformed("results.metadata.title is empty".to_string()));
        }
        if !metadata.length.is_finite() || metadata.length < 0.0 {
            return Err(malformed(format!(
                "results.metadata.length is not a valid duration: {}",
                metadata.length
            )));
        }

        Ok(Self { metadata, payload })
    }

    /// The full response body, as forwarded to the chunking service.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Opaque transcript returned by the chunking service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkingResult(Value);

impl ChunkingResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Audio transcription service.
#[async_trait]
pub trait AudioService: Send + Sync {
    /// Submit an audio URL for transcription.
    async fn call_audio_service(&self, audio_url: &str) -> Result<AudioServiceResult>;
}

/// Transcript chunking service.
#[async_trait]
pub trait ChunkingService: Send + Sync {
    /// Forward the full audio envelope and receive the chunked transcript.
    async fn call_chunking_service(&self, audio: &AudioServiceResult) -> Result<ChunkingResult>;
}

/// LLM analysis service.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Request one analysis of the preprocessed transcript.
    async fn call_llm_service(&self, kind: LlmKind, chunks: &ProcessedChunks) -> Result<Value>;
}
