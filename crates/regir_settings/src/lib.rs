//! ReGIR Settings
//!
//! JSON settings file for the partition and the presampling surface, and its
//! conversion into core parameter types.

pub mod settings;

pub use settings::{GridSettings, Settings, SettingsError};
