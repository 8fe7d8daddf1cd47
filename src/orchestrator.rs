//! Pipeline orchestrator for Podsum.
//!
//! Drives one episode through audio transcription, chunking and LLM analysis,
//! persisting metadata, transcript and summaries as each becomes available.
//!
//! Every stage is terminal on failure. Nothing is retried and nothing already
//! written is rolled back: a run that fails after creating its episode leaves
//! the episode behind with whatever it had reached, visible through
//! [`EpisodeStore::list_episodes`].

use crate::config::Settings;
use crate::error::{PodsumError, Result};
use crate::pipeline::{
    EpisodeProcessingRequest, PipelineFailure, PipelineStage, PipelineState, ProcessOutcome,
};
use crate::preprocess::{preprocess, ProcessedChunks};
use crate::services::{
    AudioService, ChunkingService, HttpServiceClient, LlmKind, LlmService, UpstreamService,
};
use crate::store::{open_store, EpisodeId, EpisodeStore, NewEpisode, SummaryBundle};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Result type of a pipeline run.
pub type PipelineResult<T> = std::result::Result<T, PipelineFailure>;

/// The main orchestrator for the Podsum pipeline.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct Orchestrator {
    audio: Arc<dyn AudioService>,
    chunking: Arc<dyn ChunkingService>,
    llm: Arc<dyn LlmService>,
    store: Arc<dyn EpisodeStore>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the HTTP services and the configured
    /// store.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Arc::new(HttpServiceClient::from_settings(&settings.services)?);
        let store = open_store(&settings.store)?;

        info!(
            "Using audio={} chunking={} llm={} store={}",
            settings.services.audio_url,
            settings.services.chunking_url,
            settings.services.llm_url,
            settings.store.provider
        );

        Ok(Self::with_components(
            client.clone(),
            client.clone(),
            client,
            store,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        audio: Arc<dyn AudioService>,
        chunking: Arc<dyn ChunkingService>,
        llm: Arc<dyn LlmService>,
        store: Arc<dyn EpisodeStore>,
    ) -> Self {
        Self {
            audio,
            chunking,
            llm,
            store,
        }
    }

    /// Get a reference to the episode store.
    pub fn store(&self) -> Arc<dyn EpisodeStore> {
        self.store.clone()
    }

    /// Process one episode end to end.
    ///
    /// Returns only once the summary bundle is saved, or with the first stage
    /// failure.
    #[instrument(
        skip(self, request),
        fields(run_id = %Uuid::new_v4(), audio_url = %request.audio_url)
    )]
    pub async fn process_episode(
        &self,
        request: EpisodeProcessingRequest,
    ) -> PipelineResult<ProcessOutcome> {
        let mut run = Run::default();

        // START -> AUDIO_FETCHED
        request.validate().map_err(|e| run.fail(PipelineStage::Audio, e))?;
        let audio = self
            .audio
            .call_audio_service(request.audio_url.trim())
            .await
            .map_err(|e| run.fail(PipelineStage::Audio, e))?;
        run.advance(PipelineStage::Audio);

        // AUDIO_FETCHED -> EPISODE_CREATED
        let metadata = audio.metadata.clone();
        let episode_id = self
            .store
            .create_episode(&NewEpisode {
                title: metadata.title.clone(),
                duration: metadata.length,
                audio_url: request.audio_url.trim().to_string(),
            })
            .await
            .map_err(|e| run.fail(PipelineStage::CreateEpisode, e))?;
        run.episode_id = Some(episode_id);
        run.advance(PipelineStage::CreateEpisode);

        // EPISODE_CREATED -> TRANSCRIPT_FETCHED
        let transcript = self
            .chunking
            .call_chunking_service(&audio)
            .await
            .map_err(|e| run.fail(PipelineStage::Chunking, e))?;
        run.advance(PipelineStage::Chunking);

        // TRANSCRIPT_FETCHED -> TRANSCRIPT_SAVED
        self.store
            .attach_transcript(episode_id, transcript.as_value())
            .await
            .map_err(|e| run.fail(PipelineStage::SaveTranscript, e))?;
        run.advance(PipelineStage::SaveTranscript);

        // TRANSCRIPT_SAVED -> CHUNKS_PREPROCESSED
        let chunks = preprocess(&transcript).map_err(|e| run.fail(PipelineStage::Preprocess, e))?;
        debug!("Preprocessed {} chunks", chunks.chunks.len());
        run.advance(PipelineStage::Preprocess);

        // CHUNKS_PREPROCESSED -> SUMMARIES_FETCHED
        let bundle = self
            .fetch_summaries(&chunks)
            .await
            .map_err(|e| run.fail(PipelineStage::Llm, e))?;
        run.advance(PipelineStage::Llm);

        // SUMMARIES_FETCHED -> SUMMARIES_SAVED
        self.store
            .attach_summary_bundle(episode_id, &bundle)
            .await
            .map_err(|e| run.fail(PipelineStage::SaveSummaries, e))?;
        run.advance(PipelineStage::SaveSummaries);

        info!("Episode {} processed: '{}'", episode_id, metadata.title);

        Ok(ProcessOutcome {
            episode_id,
            title: metadata.title,
            duration: metadata.length,
        })
    }

    /// Issue the four LLM calls concurrently.
    ///
    /// Fails on the first error; the calls still in flight are dropped.
    async fn fetch_summaries(&self, chunks: &ProcessedChunks) -> Result<SummaryBundle> {
        let (summary, keywords, highlights, keypoints) = tokio::try_join!(
            self.call_llm(LlmKind::Summary, chunks),
            self.call_llm(LlmKind::Keywords, chunks),
            self.call_llm(LlmKind::Highlights, chunks),
            self.call_llm(LlmKind::Keypoints, chunks),
        )?;

        Ok(SummaryBundle {
            summary,
            keywords,
            highlights,
            keypoints,
        })
    }

    /// One LLM sub-call; any failure is attributed to `kind`.
    async fn call_llm(&self, kind: LlmKind, chunks: &ProcessedChunks) -> Result<Value> {
        let service = UpstreamService::Llm(kind);
        match self.llm.call_llm_service(kind, chunks).await {
            Ok(value) => {
                debug!("LLM {} call succeeded", kind);
                Ok(value)
            }
            Err(e @ PodsumError::Upstream { .. }) if e.upstream_service() == Some(service) => {
                Err(e)
            }
            Err(e) => Err(PodsumError::upstream(service, e.to_string())),
        }
    }
}

/// Progress of a single run.
#[derive(Debug)]
struct Run {
    state: PipelineState,
    episode_id: Option<EpisodeId>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            state: PipelineState::Start,
            episode_id: None,
        }
    }
}

impl Run {
    fn advance(&mut self, stage: PipelineStage) {
        debug_assert_eq!(self.state, stage.from_state());
        self.state = stage.to_state();
        info!("{} -> {}", stage.from_state(), self.state);
    }

    fn fail(&self, stage: PipelineStage, cause: PodsumError) -> PipelineFailure {
        match self.episode_id {
            Some(id) => warn!(
                "Stage '{}' failed in {}; episode {} left incomplete: {}",
                stage, self.state, id, cause
            ),
            None => warn!("Stage '{}' failed in {}: {}", stage, self.state, cause),
        }
        PipelineFailure::new(stage, cause)
    }
}
