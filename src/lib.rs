//! Podsum - Podcast episode processing pipeline
//!
//! Takes a podcast episode by audio URL, has it transcribed, chunked and
//! analysed by downstream services, and stores the episode, its transcript and
//! its LLM summaries.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `services` - Typed clients for the audio, chunking and LLM services
//! - `preprocess` - Chunking output to LLM input transformation
//! - `store` - Episode persistence
//! - `pipeline` - Pipeline states, requests and failures
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use podsum::config::Settings;
//! use podsum::orchestrator::Orchestrator;
//! use podsum::pipeline::EpisodeProcessingRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let request = EpisodeProcessingRequest::new("https://example.com/ep1.mp3");
//!     let outcome = orchestrator.process_episode(request).await?;
//!     println!("Episode {} processed", outcome.episode_id);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod preprocess;
pub mod services;
pub mod store;

pub use error::{ErrorKind, PodsumError, Result};
