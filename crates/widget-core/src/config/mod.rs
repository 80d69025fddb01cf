//! # Widget Configuration
//!
//! Configuration is handed to the kernel once, as a [`ConfigData`] map built
//! in code or loaded from a JSON, YAML or TOML file. The [`ConfigGate`]
//! enforces the set-once rule and answers key lookups; the kernel itself
//! reads the typed [`AppConfig`] view.
pub mod data;
pub mod error;
pub mod gate;
pub mod settings;

pub use data::{ConfigData, ConfigFormat};
pub use error::ConfigError;
pub use gate::ConfigGate;
pub use settings::{AppConfig, DbConfig, MiddlewareFlags, ModuleKind};

// Test module declaration
#[cfg(test)]
mod tests;
