use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::data::ConfigData;
use crate::config::error::ConfigError;
use crate::config::settings::AppConfig;

/// Holds the application configuration and accepts it exactly once.
///
/// The raw [`ConfigData`] is kept next to the typed [`AppConfig`] so that
/// lookups by key see whatever the caller stored, including keys the kernel
/// does not recognise. Keys on the denylist always read as absent.
#[derive(Debug, Default)]
pub struct ConfigGate {
    data: Option<ConfigData>,
    settings: Option<Arc<AppConfig>>,
    denylist: HashSet<String>,
}

impl ConfigGate {
    /// Create an empty gate with no denylist
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty gate that hides `keys` from [`get`](Self::get).
    pub fn with_denylist<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Store the configuration. Fails with `AlreadySet` on every call after the first
    /// successful one; the stored payload is never replaced.
    pub fn set(&mut self, data: ConfigData) -> Result<Arc<AppConfig>, ConfigError> {
        if self.data.is_some() {
            return Err(ConfigError::AlreadySet);
        }

        let settings = Arc::new(data.to_typed::<AppConfig>()?);
        self.data = Some(data);
        self.settings = Some(settings.clone());
        Ok(settings)
    }

    pub fn is_set(&self) -> bool {
        self.data.is_some()
    }

    /// Typed settings, or `NotSet` before [`set`](Self::set).
    pub fn require(&self) -> Result<Arc<AppConfig>, ConfigError> {
        self.settings.clone().ok_or(ConfigError::NotSet)
    }

    /// Value stored under `key`; `None` when unset, absent or denylisted.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if self.denylist.contains(key) {
            return None;
        }
        self.data.as_ref().and_then(|data| data.get_value(key))
    }

    pub fn is_denied(&self, key: &str) -> bool {
        self.denylist.contains(key)
    }

    /// Replace the value of an existing key.
    ///
    /// Keys that were not present when the configuration was set are ignored
    /// and `Ok(false)` is returned. The typed view is rebuilt after a change;
    /// if the new value does not fit it, the old value is restored.
    pub fn update<T: Serialize>(&mut self, key: &str, value: T) -> Result<bool, ConfigError> {
        let data = self.data.as_mut().ok_or(ConfigError::NotSet)?;
        if !data.contains_key(key) {
            log::debug!("Ignoring update of unknown configuration key '{}'", key);
            return Ok(false);
        }

        let previous = data.get_value(key).cloned();
        data.set(key, value)?;

        match data.to_typed::<AppConfig>() {
            Ok(settings) => {
                self.settings = Some(Arc::new(settings));
                Ok(true)
            }
            Err(e) => {
                if let Some(previous) = previous {
                    data.set(key, previous)?;
                }
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
