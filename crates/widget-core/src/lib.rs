pub mod config;
pub mod kernel;
pub mod model;
pub mod registry;
pub mod routing;
pub mod utils;

// Re-export key public types for the binary and plugins
pub use config::{AppConfig, ConfigData, ConfigError, ConfigGate};
pub use kernel::error::Error as KernelError;
pub use kernel::{Application, KernelState, Manifest, Services};
pub use model::{CollectionDefinition, ModelDefinition, ModelError, ModelHooks, ModelInstance};
pub use registry::{Controller, ControllerFactory, Plugin, RegistryError};
pub use routing::{Handler, HandlerResult, HttpError, Next, Request, Response};

#[cfg(test)]
mod tests;
