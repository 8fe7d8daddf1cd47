//! SQLite-based episode store.
//!
//! Episodes live in `episodes`; transcripts and summary bundles share one
//! `episode_summaries` row per episode, keyed by the episode id.

use super::{
    Episode, EpisodeId, EpisodeOverview, EpisodeRecord, EpisodeStatus, EpisodeStore, NewEpisode,
    SummaryBundle,
};
use crate::error::{PodsumError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS episodes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        duration REAL NOT NULL,
        audio_url TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS episode_summaries (
        id INTEGER PRIMARY KEY REFERENCES episodes(id),
        transcript TEXT,
        summary TEXT,
        keywords TEXT,
        highlights TEXT,
        keypoints TEXT,
        transcribed_at TEXT,
        summarized_at TEXT
    );
"#;

const EPISODE_COLUMNS: &str = "e.id, e.title, e.duration, e.audio_url, e.created_at";

/// SQLite-based episode store.
pub struct SqliteEpisodeStore {
    conn: Mutex<Connection>,
}

impl SqliteEpisodeStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::init(conn)?;

        info!("Initialized SQLite episode store at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PodsumError::Persistence(format!("Failed to acquire lock: {}", e)))
    }

    fn episode_exists(conn: &Connection, id: EpisodeId) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM episodes WHERE id = ?1",
                params![id.get()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn require_episode(conn: &Connection, id: EpisodeId) -> Result<()> {
        if Self::episode_exists(conn, id)? {
            Ok(())
        } else {
            Err(PodsumError::Persistence(format!("Episode {} does not exist", id)))
        }
    }

    fn episode_from_row(row: &Row<'_>) -> rusqlite::Result<Episode> {
        let created_at: String = row.get(4)?;
        Ok(Episode {
            id: EpisodeId::new(row.get(0)?),
            title: row.get(1)?,
            duration: row.get(2)?,
            audio_url: row.get(3)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn decode(column: &str, raw: Option<String>) -> Result<Option<Value>> {
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|e| {
            PodsumError::Persistence(format!("Stored {} is not valid JSON: {}", column, e))
        })
    })
    .transpose()
}

fn require(column: &str, value: Option<Value>) -> Result<Value> {
    value.ok_or_else(|| {
        PodsumError::Persistence(format!("Stored summary bundle has no {}", column))
    })
}

#[async_trait]
impl EpisodeStore for SqliteEpisodeStore {
    #[instrument(skip(self, episode), fields(title = %episode.title))]
    async fn create_episode(&self, episode: &NewEpisode) -> Result<EpisodeId> {
        let conn = self.lock()?;

        let id: Option<i64> = conn
            .query_row(
                r#"
                INSERT INTO episodes (title, duration, audio_url, created_at)
                VALUES (?1, ?2, ?3, ?4)
                RETURNING id
                "#,
                params![
                    episode.title,
                    episode.duration,
                    episode.audio_url,
                    Utc::now().to_rfc3339(),
                ],
                |row| row.get(0),
            )
            .optional()?;

        // An insert that is accepted but yields no id is a failure.
        let id = id.map(EpisodeId::new).ok_or_else(|| {
            PodsumError::Persistence("Episode insert returned no identifier".to_string())
        })?;

        info!("Created episode {}", id);
        Ok(id)
    }

    #[instrument(skip(self, transcript))]
    async fn attach_transcript(&self, id: EpisodeId, transcript: &Value) -> Result<()> {
        let conn = self.lock()?;
        Self::require_episode(&conn, id)?;

        let transcript_json = serde_json::to_string(transcript)?;
        let inserted = conn.execute(
            r#"
            INSERT INTO episode_summaries (id, transcript, transcribed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                transcript = excluded.transcript,
                transcribed_at = excluded.transcribed_at
            WHERE episode_summaries.transcript IS NULL
            "#,
            params![id.get(), transcript_json, Utc::now().to_rfc3339()],
        )?;

        if inserted == 0 {
            return Err(PodsumError::Persistence(format!(
                "Episode {} already has a transcript",
                id
            )));
        }

        debug!("Stored {} byte transcript for episode {}", transcript_json.len(), id);
        Ok(())
    }

    #[instrument(skip(self, bundle))]
    async fn attach_summary_bundle(&self, id: EpisodeId, bundle: &SummaryBundle) -> Result<()> {
        let conn = self.lock()?;
        Self::require_episode(&conn, id)?;

        let updated = conn.execute(
            r#"
            INSERT INTO episode_summaries
                (id, summary, keywords, highlights, keypoints, summarized_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                summary = excluded.summary,
                keywords = excluded.keywords,
                highlights = excluded.highlights,
                keypoints = excluded.keypoints,
                summarized_at = excluded.summarized_at
            WHERE episode_summaries.summary IS NULL
            "#,
            params![
                id.get(),
                serde_json::to_string(&bundle.summary)?,
                serde_json::to_string(&bundle.keywords)?,
                serde_json::to_string(&bundle.highlights)?,
                serde_json::to_string(&bundle.keypoints)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(PodsumError::Persistence(format!(
                "Episode {} already has a summary bundle",
                id
            )));
        }

        info!("Stored summary bundle for episode {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_episode(&self, id: EpisodeId) -> Result<Option<EpisodeRecord>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                &format!(
                    r#"
                    SELECT {EPISODE_COLUMNS},
                           s.transcript, s.summary, s.keywords, s.highlights, s.keypoints
                    FROM episodes e
                    LEFT JOIN episode_summaries s ON s.id = e.id
                    WHERE e.id = ?1
                    "#
                ),
                params![id.get()],
                |row| {
                    let columns: [Option<String>; 5] = [
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                        row.get(9)?,
                    ];
                    Ok((Self::episode_from_row(row)?, columns))
                },
            )
            .optional()?;

        let Some((episode, [transcript, summary, keywords, highlights, keypoints])) = row else {
            return Ok(None);
        };

        let transcript = decode("transcript", transcript)?;
        let summaries = match decode("summary", summary)? {
            Some(summary) => Some(SummaryBundle {
                summary,
                keywords: require("keywords", decode("keywords", keywords)?)?,
                highlights: require("highlights", decode("highlights", highlights)?)?,
                keypoints: require("keypoints", decode("keypoints", keypoints)?)?,
            }),
            None => None,
        };

        Ok(Some(EpisodeRecord {
            episode,
            transcript,
            summaries,
        }))
    }

    #[instrument(skip(self))]
    async fn list_episodes(&self) -> Result<Vec<EpisodeOverview>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {EPISODE_COLUMNS},
                   s.transcript IS NOT NULL, s.summary IS NOT NULL
            FROM episodes e
            LEFT JOIN episode_summaries s ON s.id = e.id
            ORDER BY e.id
            "#
        ))?;

        let rows = stmt.query_map([], |row| {
            let has_transcript: Option<bool> = row.get(5)?;
            let has_summaries: Option<bool> = row.get(6)?;
            Ok(EpisodeOverview {
                episode: Self::episode_from_row(row)?,
                status: EpisodeStatus::from_presence(
                    has_transcript.unwrap_or(false),
                    has_summaries.unwrap_or(false),
                ),
            })
        })?;

        let episodes = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Listed {} episodes", episodes.len());
        Ok(episodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_episode(title: &str) -> NewEpisode {
        NewEpisode {
            title: title.to_string(),
            duration: 1800.0,
            audio_url: "https://example.com/ep1.mp3".to_string(),
        }
    }

    fn bundle() -> SummaryBundle {
        SummaryBundle {
            summary: json!("S"),
            keywords: json!(["K"]),
            highlights: json!({ "items": ["H"] }),
            keypoints: json!(["P"]),
        }
    }

    #[tokio::test]
    async fn test_full_episode_lifecycle() {
        let store = SqliteEpisodeStore::in_memory().unwrap();

        let id = store.create_episode(&new_episode("Ep1")).await.unwrap();
        let record = store.get_episode(id).await.unwrap().unwrap();
        assert_eq!(record.status(), EpisodeStatus::MetadataOnly);
        assert_eq!(record.episode.title, "Ep1");
        assert_eq!(record.episode.duration, 1800.0);

        store.attach_transcript(id, &json!({ "chunks": ["T1"] })).await.unwrap();
        let record = store.get_episode(id).await.unwrap().unwrap();
        assert_eq!(record.status(), EpisodeStatus::Transcribed);
        assert_eq!(record.transcript, Some(json!({ "chunks": ["T1"] })));

        store.attach_summary_bundle(id, &bundle()).await.unwrap();
        let record = store.get_episode(id).await.unwrap().unwrap();
        assert_eq!(record.status(), EpisodeStatus::Complete);
        assert_eq!(record.summaries, Some(bundle()));
        assert!(record.transcript.is_some());
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let store = SqliteEpisodeStore::in_memory().unwrap();
        let first = store.create_episode(&new_episode("a")).await.unwrap();
        let second = store.create_episode(&new_episode("b")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_attach_to_unknown_episode_fails() {
        let store = SqliteEpisodeStore::in_memory().unwrap();
        let unknown = EpisodeId::new(99);

        let err = store.attach_transcript(unknown, &json!("T")).await.unwrap_err();
        assert!(matches!(err, PodsumError::Persistence(_)));

        let err = store.attach_summary_bundle(unknown, &bundle()).await.unwrap_err();
        assert!(matches!(err, PodsumError::Persistence(_)));

        assert!(store.list_episodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attach_twice_fails() {
        let store = SqliteEpisodeStore::in_memory().unwrap();
        let id = store.create_episode(&new_episode("Ep1")).await.unwrap();

        store.attach_transcript(id, &json!("T1")).await.unwrap();
        assert!(store.attach_transcript(id, &json!("T2")).await.is_err());

        store.attach_summary_bundle(id, &bundle()).await.unwrap();
        assert!(store.attach_summary_bundle(id, &bundle()).await.is_err());

        let record = store.get_episode(id).await.unwrap().unwrap();
        assert_eq!(record.transcript, Some(json!("T1")));
    }

    #[tokio::test]
    async fn test_insert_without_identifier_is_failure() {
        let store = SqliteEpisodeStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER swallow BEFORE INSERT ON episodes BEGIN SELECT RAISE(IGNORE); END;",
            )
            .unwrap();

        let err = store.create_episode(&new_episode("Ep1")).await.unwrap_err();
        assert!(matches!(err, PodsumError::Persistence(_)));
        assert!(err.to_string().contains("no identifier"));
    }

    #[tokio::test]
    async fn test_list_reports_status() {
        let store = SqliteEpisodeStore::in_memory().unwrap();
        let orphan = store.create_episode(&new_episode("orphan")).await.unwrap();
        let done = store.create_episode(&new_episode("done")).await.unwrap();
        store.attach_transcript(done, &json!("T")).await.unwrap();
        store.attach_summary_bundle(done, &bundle()).await.unwrap();

        let listed = store.list_episodes().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].episode.id, orphan);
        assert_eq!(listed[0].status, EpisodeStatus::MetadataOnly);
        assert_eq!(listed[1].status, EpisodeStatus::Complete);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("episodes.db");

        let id = {
            let store = SqliteEpisodeStore::new(&path).unwrap();
            let id = store.create_episode(&new_episode("Ep1")).await.unwrap();
            store.attach_transcript(id, &json!("T1")).await.unwrap();
            id
        };

        let reopened = SqliteEpisodeStore::new(&path).unwrap();
        let record = reopened.get_episode(id).await.unwrap().unwrap();
        assert_eq!(record.episode.title, "Ep1");
        assert_eq!(record.status(), EpisodeStatus::Transcribed);
    }

    #[tokio::test]
    async fn test_get_missing_episode() {
        let store = SqliteEpisodeStore::in_memory().unwrap();
        assert!(store.get_episode(EpisodeId::new(1)).await.unwrap().is_none());
    }
}
