//! # Widget Kernel Errors
//!
//! Defines the kernel-level [`Error`] that every subsystem error converts
//! into, plus the [`KernelLifecyclePhase`] used to tag startup failures.
//!
//! Startup errors (configuration, duplicate registrations, module load
//! failures) abort [`Application::start`](crate::kernel::Application::start).
//! Request-time errors never reach this type; they surface as
//! [`HttpError`](crate::routing::HttpError) responses instead.
use std::path::PathBuf;
use std::result::Result as StdResult;

use crate::config::error::ConfigError;
use crate::model::error::ModelError;
use crate::registry::error::RegistryError;
use crate::routing::error::RouteError;
use thiserror::Error as ThisError;

/// Kernel error type
#[derive(Debug, ThisError)]
pub enum Error {
    /// Configuration gate errors (`AlreadySet`, `NotSet`, load and parse failures)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Component registry errors (`DuplicateName`, `NotFound`)
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Route registration errors
    #[error("Routing error: {0}")]
    Routing(#[from] RouteError),

    /// Persistence, lifecycle hook and slug errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("I/O error during '{operation}' on '{}': {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        operation: String,
        path: PathBuf,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// The ordered startup phases driven by [`Application`](crate::kernel::Application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Configure")]
    Configure,
    #[error("PersistenceBootstrap")]
    PersistenceBootstrap,
    #[error("ModelBase")]
    ModelBase,
    #[error("LoadModels")]
    LoadModels,
    #[error("LoadCollections")]
    LoadCollections,
    #[error("ControllerBase")]
    ControllerBase,
    #[error("LoadPlugins")]
    LoadPlugins,
    #[error("LoadControllers")]
    LoadControllers,
    #[error("LoadRoutes")]
    LoadRoutes,
    #[error("LoadWidgets")]
    LoadWidgets,
    #[error("Listen")]
    Listen,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Wraps `source` as the failure of a startup `phase`.
    pub fn lifecycle(phase: KernelLifecyclePhase, message: impl Into<String>, source: Option<Error>) -> Self {
        Error::KernelLifecycleError {
            phase,
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    /// Raised when an operation needs a subsystem that an earlier phase has not built yet.
    pub fn not_ready(phase: KernelLifecyclePhase, what: &str) -> Self {
        Error::lifecycle(phase, format!("{} is not initialized yet", what), None)
    }

    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}
