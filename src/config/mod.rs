//! Configuration module for Podsum.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    GeneralSettings, ServerSettings, ServiceSettings, Settings, StoreProvider, StoreSettings,
};
