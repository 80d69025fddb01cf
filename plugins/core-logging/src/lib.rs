//! Logging for Widget applications.
//!
//! Library code logs through the `log` facade. This plugin installs a
//! `tracing-subscriber` fmt subscriber filtered by `RUST_LOG` (falling back
//! to `debug` in development and `info` otherwise) and bridges `log`
//! records into it with `tracing-log`. Output goes to stderr so command
//! output on stdout stays clean.
use std::any::Any;
use std::sync::Arc;

use log::{debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;
use widget_core::config::AppConfig;
use widget_core::kernel::error::{Error as KernelError, Result as KernelResult};
use widget_core::registry::Plugin;

/// Registry key of this plugin
pub const PLUGIN_NAME: &str = "core-logging";

/// Filter used outside development when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Filter used in development when `RUST_LOG` is unset
pub const DEVELOPMENT_FILTER: &str = "debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingPlugin {
    filter: String,
    installed: bool,
}

impl LoggingPlugin {
    /// Plugin state for `config`, without touching the global subscriber.
    pub fn from_config(config: &AppConfig) -> Self {
        let fallback = if config.is_development() {
            DEVELOPMENT_FILTER
        } else {
            DEFAULT_FILTER
        };
        Self {
            filter: fallback.to_string(),
            installed: false,
        }
    }

    /// Directives applied when `RUST_LOG` does not parse or is unset
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Whether this instance installed the global subscriber
    pub fn installed(&self) -> bool {
        self.installed
    }

    /// Install the subscriber. Returns `Ok(false)` when one is already in place.
    pub fn install(&mut self) -> KernelResult<bool> {
        self.installed = init(&self.filter)?;
        Ok(self.installed)
    }
}

impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `RUST_LOG` when set and valid, else `fallback`.
pub fn env_filter(fallback: &str) -> KernelResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|e| KernelError::Other(format!("Invalid log filter '{}': {}", fallback, e)))
}

/// Install the global subscriber and the `log` bridge.
///
/// Only the first call in a process installs anything; later calls return
/// `Ok(false)`.
pub fn init(fallback: &str) -> KernelResult<bool> {
    let filter = env_filter(fallback)?;
    if LogTracer::init().is_err() {
        debug!("A log subscriber is already installed; keeping it");
        return Ok(false);
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| KernelError::Other(format!("Failed to install tracing subscriber: {}", e)))?;
    info!("Logging initialized");
    Ok(true)
}

/// Manifest plugin factory: builds the plugin for `config` and installs logging.
pub fn factory(config: &AppConfig) -> KernelResult<Arc<dyn Plugin>> {
    let mut plugin = LoggingPlugin::from_config(config);
    plugin.install()?;
    Ok(Arc::new(plugin))
}
