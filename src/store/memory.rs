//! In-memory episode store implementation.
//!
//! Useful for testing and one-off runs.

use super::{
    Episode, EpisodeId, EpisodeOverview, EpisodeRecord, EpisodeStore, NewEpisode, SummaryBundle,
};
use crate::error::{PodsumError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    last_id: i64,
    records: BTreeMap<EpisodeId, EpisodeRecord>,
}

/// In-memory episode store.
#[derive(Default)]
pub struct MemoryEpisodeStore {
    state: RwLock<State>,
}

impl MemoryEpisodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| PodsumError::Persistence(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| PodsumError::Persistence(format!("Failed to acquire lock: {}", e)))
    }
}

fn record_mut(state: &mut State, id: EpisodeId) -> Result<&mut EpisodeRecord> {
    state
        .records
        .get_mut(&id)
        .ok_or_else(|| PodsumError::Persistence(format!("Episode {} does not exist", id)))
}

#[async_trait]
impl EpisodeStore for MemoryEpisodeStore {
    async fn create_episode(&self, episode: &NewEpisode) -> Result<EpisodeId> {
        let mut state = self.write()?;
        state.last_id += 1;
        let id = EpisodeId::new(state.last_id);

        state.records.insert(
            id,
            EpisodeRecord {
                episode: Episode {
                    id,
                    title: episode.title.clone(),
                    duration: episode.duration,
                    audio_url: episode.audio_url.clone(),
                    created_at: Utc::now(),
                },
                transcript: None,
                summaries: None,
            },
        );
        Ok(id)
    }

    async fn attach_transcript(&self, id: EpisodeId, transcript: &Value) -> Result<()> {
        let mut state = self.write()?;
        let record = record_mut(&mut state, id)?;
        if record.transcript.is_some() {
            return Err(PodsumError::Persistence(format!(
                "Episode {} already has a transcript",
                id
            )));
        }
        record.transcript = Some(transcript.clone());
        Ok(())
    }

    async fn attach_summary_bundle(&self, id: EpisodeId, bundle: &SummaryBundle) -> Result<()> {
        let mut state = self.write()?;
        let record = record_mut(&mut state, id)?;
        if record.summaries.is_some() {
            return Err(PodsumError::Persistence(format!(
                "Episode {} already has a summary bundle",
                id
            )));
        }
        record.summaries = Some(bundle.clone());
        Ok(())
    }

    async fn get_episode(&self, id: EpisodeId) -> Result<Option<EpisodeRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn list_episodes(&self) -> Result<Vec<EpisodeOverview>> {
        Ok(self
            .read()?
            .records
            .values()
            .map(|record| EpisodeOverview {
                episode: record.episode.clone(),
                status: record.status(),
            })
            .collect())
    }
}
