//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use super::open_saved_store;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(incomplete: bool, settings: &Settings) -> Result<()> {
    let store = open_saved_store(settings)?;

    let episodes = match store.list_episodes().await {
        Ok(episodes) => episodes,
        Err(e) => {
            Output::error(&format!("Failed to list episodes: {}", e));
            return Err(e.into());
        }
    };

    let total = episodes.len();
    let shown: Vec<_> = episodes
        .into_iter()
        .filter(|e| !incomplete || !e.status.is_complete())
        .collect();

    if shown.is_empty() {
        if incomplete {
            Output::success("No incomplete episodes.");
        } else {
            Output::info("No episodes yet. Use 'podsum process <audio_url>' to add one.");
        }
        return Ok(());
    }

    let heading = if incomplete { "Incomplete Episodes" } else { "Episodes" };
    Output::header(&format!("{} ({})", heading, shown.len()));
    println!();

    for overview in &shown {
        Output::episode(overview);
    }

    let complete = shown.iter().filter(|e| e.status.is_complete()).count();
    println!();
    Output::kv("Total episodes", &total.to_string());
    if !incomplete {
        Output::kv("Complete", &complete.to_string());
    }

    Ok(())
}
