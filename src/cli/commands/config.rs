//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};

/// Run the config command.
///
/// `show` prints the effective settings, after environment overrides.
pub fn run_config(action: &ConfigAction, settings: &Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", render(settings)?);
        }

        ConfigAction::Path => {
            let path = Settings::default_config_path();
            println!("{}", path.display());
            if !path.exists() {
                Output::info("No config file yet; built-in defaults are in use.");
            }
        }
    }

    Ok(())
}

fn render(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_round_trips_overrides() {
        let mut settings = Settings::default();
        settings.services.llm_url = "http://llm:9000".to_string();

        let text = render(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.services.llm_url, "http://llm:9000");
        assert!(text.contains("[services]"));
    }
}
