//! Pipeline states, requests, and the uniform failure value.

use crate::error::{ErrorKind, PodsumError, Result};
use crate::services::UpstreamService;
use crate::store::EpisodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// States of one pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineState {
    Start,
    AudioFetched,
    EpisodeCreated,
    TranscriptFetched,
    TranscriptSaved,
    ChunksPreprocessed,
    SummariesFetched,
    /// The only successful terminal state.
    SummariesSaved,
}

impl PipelineState {
    pub const ALL: [PipelineState; 8] = [
        PipelineState::Start,
        PipelineState::AudioFetched,
        PipelineState::EpisodeCreated,
        PipelineState::TranscriptFetched,
        PipelineState::TranscriptSaved,
        PipelineState::ChunksPreprocessed,
        PipelineState::SummariesFetched,
        PipelineState::SummariesSaved,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PipelineState::Start => "START",
            PipelineState::AudioFetched => "AUDIO_FETCHED",
            PipelineState::EpisodeCreated => "EPISODE_CREATED",
            PipelineState::TranscriptFetched => "TRANSCRIPT_FETCHED",
            PipelineState::TranscriptSaved => "TRANSCRIPT_SAVED",
            PipelineState::ChunksPreprocessed => "CHUNKS_PREPROCESSED",
            PipelineState::SummariesFetched => "SUMMARIES_FETCHED",
            PipelineState::SummariesSaved => "SUMMARIES_SAVED",
        }
    }

    /// The state that follows this one, if any.
    pub fn next(self) -> Option<PipelineState> {
        let position = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(position + 1).copied()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A pipeline step: the transition out of one state into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Audio,
    CreateEpisode,
    Chunking,
    SaveTranscript,
    Preprocess,
    Llm,
    SaveSummaries,
}

impl PipelineStage {
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Audio => "audio",
            PipelineStage::CreateEpisode => "create_episode",
            PipelineStage::Chunking => "chunking",
            PipelineStage::SaveTranscript => "save_transcript",
            PipelineStage::Preprocess => "preprocess",
            PipelineStage::Llm => "llm",
            PipelineStage::SaveSummaries => "save_summaries",
        }
    }

    /// State the pipeline is in while this stage runs.
    pub fn from_state(self) -> PipelineState {
        match self {
            PipelineStage::Audio => PipelineState::Start,
            PipelineStage::CreateEpisode => PipelineState::AudioFetched,
            PipelineStage::Chunking => PipelineState::EpisodeCreated,
            PipelineStage::SaveTranscript => PipelineState::TranscriptFetched,
            PipelineStage::Preprocess => PipelineState::TranscriptSaved,
            PipelineStage::Llm => PipelineState::ChunksPreprocessed,
            PipelineStage::SaveSummaries => PipelineState::SummariesFetched,
        }
    }

    /// State reached when this stage succeeds.
    pub fn to_state(self) -> PipelineState {
        match self {
            PipelineStage::Audio => PipelineState::AudioFetched,
            PipelineStage::CreateEpisode => PipelineState::EpisodeCreated,
            PipelineStage::Chunking => PipelineState::TranscriptFetched,
            PipelineStage::SaveTranscript => PipelineState::TranscriptSaved,
            PipelineStage::Preprocess => PipelineState::ChunksPreprocessed,
            PipelineStage::Llm => PipelineState::SummariesFetched,
            PipelineStage::SaveSummaries => PipelineState::SummariesSaved,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A request to process one episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeProcessingRequest {
    pub audio_url: String,
}

impl EpisodeProcessingRequest {
    pub fn new(audio_url: impl Into<String>) -> Self {
        Self {
            audio_url: audio_url.into(),
        }
    }

    /// The audio URL must be an absolute http(s) URL with a host.
    pub fn validate(&self) -> Result<()> {
        let raw = self.audio_url.trim();
        if raw.is_empty() {
            return Err(PodsumError::Validation("audio_url is required".to_string()));
        }

        let parsed = url::Url::parse(raw)
            .map_err(|e| PodsumError::Validation(format!("audio_url is not a valid URL: {}", e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PodsumError::Validation(format!(
                "audio_url must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(PodsumError::Validation("audio_url has no host".to_string()));
        }

        Ok(())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub episode_id: EpisodeId,
    pub title: String,
    pub duration: f64,
}

impl ProcessOutcome {
    pub fn status(&self) -> &'static str {
        "success"
    }
}

/// Why a run stopped: the stage that failed and its cause.
#[derive(Debug, thiserror::Error)]
#[error("Stage '{stage}' failed: {source}")]
pub struct PipelineFailure {
    stage: PipelineStage,
    #[source]
    source: PodsumError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, source: PodsumError) -> Self {
        Self { stage, source }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Last state successfully reached before the failure.
    pub fn reached(&self) -> PipelineState {
        self.stage.from_state()
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn cause(&self) -> &PodsumError {
        &self.source
    }

    /// The failing remote call, for upstream failures.
    pub fn upstream_service(&self) -> Option<UpstreamService> {
        self.source.upstream_service()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LlmKind;

    #[test]
    fn test_state_order() {
        assert_eq!(PipelineState::Start.next(), Some(PipelineState::AudioFetched));
        assert_eq!(PipelineState::SummariesSaved.next(), None);
        assert!(PipelineState::EpisodeCreated < PipelineState::TranscriptSaved);
    }

    #[test]
    fn test_stages_chain_states() {
        let stages = [
            PipelineStage::Audio,
            PipelineStage::CreateEpisode,
            PipelineStage::Chunking,
            PipelineStage::SaveTranscript,
            PipelineStage::Preprocess,
            PipelineStage::Llm,
            PipelineStage::SaveSummaries,
        ];
        for stage in stages {
            assert_eq!(stage.from_state().next(), Some(stage.to_state()));
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(EpisodeProcessingRequest::new("https://example.com/ep1.mp3")
            .validate()
            .is_ok());

        for bad in [
            "",
            "   ",
            "example.com/ep1.mp3",
            "ftp://example.com/a.mp3",
            "file:///tmp/a.mp3",
        ] {
            let err = EpisodeProcessingRequest::new(bad).validate().unwrap_err();
            assert!(matches!(err, PodsumError::Validation(_)), "{} accepted", bad);
        }
    }

    #[test]
    fn test_failure_display_and_accessors() {
        let failure = PipelineFailure::new(
            PipelineStage::Llm,
            PodsumError::upstream(UpstreamService::Llm(LlmKind::Highlights), "HTTP 503"),
        );
        assert_eq!(
            failure.to_string(),
            "Stage 'llm' failed: Upstream llm/highlights service error: HTTP 503"
        );
        assert_eq!(failure.reached(), PipelineState::ChunksPreprocessed);
        assert_eq!(failure.kind(), ErrorKind::Upstream);
        assert_eq!(
            failure.upstream_service().and_then(UpstreamService::subkind),
            Some(LlmKind::Highlights)
        );
    }
}
