//! Show command implementation.

use crate::cli::output::format_duration;
use crate::cli::Output;
use crate::config::Settings;
use crate::store::EpisodeId;
use super::open_saved_store;
use anyhow::Result;

/// Run the show command.
pub async fn run_show(episode_id: &str, settings: &Settings) -> Result<()> {
    let id: EpisodeId = episode_id.parse()?;
    let store = open_saved_store(settings)?;

    let Some(record) = store.get_episode(id).await? else {
        Output::error(&format!("Episode {} not found", id));
        return Err(anyhow::anyhow!("Episode {} not found", id));
    };

    Output::header(&record.episode.title);
    Output::kv("Id", &record.episode.id.to_string());
    Output::kv("Audio", &record.episode.audio_url);
    Output::kv("Duration", &format_duration(record.episode.duration));
    Output::kv("Created", &record.episode.created_at.to_rfc3339());
    Output::kv("Status", &record.status().to_string());

    if let Some(summaries) = &record.summaries {
        println!();
        println!("{}", serde_json::to_string_pretty(summaries)?);
    } else if record.transcript.is_some() {
        Output::warning("Transcript saved but summaries are missing.");
    } else {
        Output::warning("Only metadata was saved for this episode.");
    }

    Ok(())
}
