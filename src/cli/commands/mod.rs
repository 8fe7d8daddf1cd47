//! CLI command implementations.

mod config;
mod list;
mod process;
mod serve;
mod show;

pub use config::run_config;
pub use list::run_list;
pub use process::run_process;
pub use serve::{router, run_serve};
pub use show::run_show;

use crate::config::{Settings, StoreProvider};
use crate::store::{open_store, EpisodeStore};
use std::sync::Arc;

/// Open the store for commands that read back earlier runs.
///
/// A memory store starts empty in every process, so it is refused here.
fn open_saved_store(settings: &Settings) -> anyhow::Result<Arc<dyn EpisodeStore>> {
    if settings.store.provider == StoreProvider::Memory {
        anyhow::bail!(
            "store.provider is 'memory'; episodes from earlier runs are not kept. \
             Use the sqlite provider, or query a running 'podsum serve' instead."
        );
    }
    Ok(open_store(&settings.store)?)
}
