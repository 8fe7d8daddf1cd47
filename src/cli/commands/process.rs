//! Process command implementation.

use crate::cli::output::format_duration;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::pipeline::EpisodeProcessingRequest;
use anyhow::Result;

/// Run the process command.
pub async fn run_process(audio_url: &str, settings: &Settings) -> Result<()> {
    Output::info(&format!("Processing: {}", audio_url));

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Running pipeline...");
    let result = orchestrator
        .process_episode(EpisodeProcessingRequest::new(audio_url))
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            Output::success(&format!("Processed '{}'", outcome.title));
            Output::kv("Episode", &outcome.episode_id.to_string());
            Output::kv("Duration", &format_duration(outcome.duration));
            Output::kv("Status", outcome.status());
            Ok(())
        }
        Err(failure) => {
            Output::error(&failure.to_string());
            Output::kv("Stage", failure.stage().label());
            Output::kv("Kind", failure.kind().as_str());
            if failure.kind().is_retryable() {
                Output::info(
                    "The run can be retried. \
                     Use 'podsum list --incomplete' to inspect partial episodes.",
                );
            }
            Err(failure.into())
        }
    }
}
