//! Episode store abstraction for Podsum.
//!
//! Persists episode metadata, transcripts and summary bundles. Identifiers are
//! always issued by the store; attaches are only accepted for identifiers the
//! store has issued itself.

mod memory;
mod sqlite;

pub use memory::MemoryEpisodeStore;
pub use sqlite::SqliteEpisodeStore;

use crate::config::{StoreProvider, StoreSettings};
use crate::error::{PodsumError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Store-generated episode identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(i64);

impl EpisodeId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EpisodeId {
    type Err = PodsumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(EpisodeId)
            .map_err(|_| PodsumError::Validation(format!("Invalid episode id: {}", s)))
    }
}

/// Fields supplied when creating an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEpisode {
    pub title: String,
    /// Duration in seconds.
    pub duration: f64,
    pub audio_url: String,
}

/// A persisted episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub title: String,
    pub duration: f64,
    pub audio_url: String,
    pub created_at: DateTime<Utc>,
}

/// The four LLM analyses of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBundle {
    pub summary: Value,
    pub keywords: Value,
    pub highlights: Value,
    pub keypoints: Value,
}

/// How far the pipeline got for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    /// Metadata only; the run stopped before the transcript was saved.
    MetadataOnly,
    /// Transcript saved, summaries missing.
    Transcribed,
    Complete,
}

impl EpisodeStatus {
    fn from_presence(has_transcript: bool, has_summaries: bool) -> Self {
        match (has_transcript, has_summaries) {
            (_, true) => EpisodeStatus::Complete,
            (true, false) => EpisodeStatus::Transcribed,
            (false, false) => EpisodeStatus::MetadataOnly,
        }
    }

    pub fn is_complete(self) -> bool {
        self == EpisodeStatus::Complete
    }
}

impl std::fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeStatus::MetadataOnly => write!(f, "metadata only"),
            EpisodeStatus::Transcribed => write!(f, "transcribed"),
            EpisodeStatus::Complete => write!(f, "complete"),
        }
    }
}

/// An episode with everything attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: Episode,
    pub transcript: Option<Value>,
    pub summaries: Option<SummaryBundle>,
}

impl EpisodeRecord {
    pub fn status(&self) -> EpisodeStatus {
        EpisodeStatus::from_presence(self.transcript.is_some(), self.summaries.is_some())
    }
}

/// Listing entry for an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOverview {
    pub episode: Episode,
    pub status: EpisodeStatus,
}

/// Trait for episode store implementations.
///
/// Every method is a single atomic write or read; no transaction spans two
/// calls.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Insert an episode and return the identifier the store assigned.
    async fn create_episode(&self, episode: &NewEpisode) -> Result<EpisodeId>;

    /// Store the transcript for an existing episode. Fails if the episode is
    /// unknown or already has a transcript.
    async fn attach_transcript(&self, id: EpisodeId, transcript: &Value) -> Result<()>;

    /// Store the summary bundle for an existing episode. Fails if the episode
    /// is unknown or already has summaries.
    async fn attach_summary_bundle(&self, id: EpisodeId, bundle: &SummaryBundle) -> Result<()>;

    /// Read back an episode with its transcript and summaries.
    async fn get_episode(&self, id: EpisodeId) -> Result<Option<EpisodeRecord>>;

    /// List all episodes, oldest first.
    async fn list_episodes(&self) -> Result<Vec<EpisodeOverview>>;
}

/// Open the store selected by the settings.
pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn EpisodeStore>> {
    match settings.provider {
        StoreProvider::Sqlite => Ok(Arc::new(SqliteEpisodeStore::new(&settings.sqlite_path())?)),
        StoreProvider::Memory => Ok(Arc::new(MemoryEpisodeStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_id_parse() {
        assert_eq!(" 42 ".parse::<EpisodeId>().unwrap(), EpisodeId::new(42));
        assert!("E1".parse::<EpisodeId>().is_err());
        assert_eq!(EpisodeId::new(7).to_string(), "7");
    }

    #[test]
    fn test_status_from_presence() {
        assert_eq!(
            EpisodeStatus::from_presence(false, false),
            EpisodeStatus::MetadataOnly
        );
        assert_eq!(
            EpisodeStatus::from_presence(true, false),
            EpisodeStatus::Transcribed
        );
        assert!(EpisodeStatus::from_presence(true, true).is_complete());
    }

    #[test]
    fn test_open_memory_store() {
        let settings = StoreSettings {
            provider: StoreProvider::Memory,
            ..StoreSettings::default()
        };
        assert!(open_store(&settings).is_ok());
    }
}
