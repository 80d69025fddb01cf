use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kernel::constants;

/// Persistence engine selection (`db` key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DbConfig {
    /// Engine client name, `memory` selects the built-in store
    pub client: String,
    /// Engine-specific connection settings, passed through untouched
    pub connection: Option<Value>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            client: constants::MEMORY_DB_CLIENT.to_string(),
            connection: None,
        }
    }
}

/// Feature switches under the `middleware` key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MiddlewareFlags {
    pub enable_sessions: bool,
    pub enable_forms: bool,
    #[serde(rename = "enableCSRF")]
    pub enable_csrf: bool,
    pub input_validation: bool,
}

/// The module kinds whose directories can be overridden in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Models,
    Collections,
    Controllers,
    Plugins,
    Routes,
    Widgets,
}

impl ModuleKind {
    /// Directory name used under `rootDir` when no override is configured
    pub fn default_dir_name(&self) -> &'static str {
        match self {
            ModuleKind::Models => "models",
            ModuleKind::Collections => "collections",
            ModuleKind::Controllers => "controllers",
            ModuleKind::Plugins => "plugins",
            ModuleKind::Routes => "routes",
            ModuleKind::Widgets => "widgets",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_dir_name())
    }
}

/// Typed view over the recognised configuration keys.
///
/// Unknown keys are ignored during deserialization; they remain reachable
/// through [`ConfigGate::get`](crate::config::ConfigGate::get).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub port: u16,
    pub ip_address: Option<String>,
    pub secret: Option<String>,
    pub db: DbConfig,
    pub root_dir: PathBuf,
    pub uploads_dir: Option<PathBuf>,
    pub views_dir: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    pub collections_dir: Option<PathBuf>,
    pub controllers_dir: Option<PathBuf>,
    pub plugins_dir: Option<PathBuf>,
    pub routes_dir: Option<PathBuf>,
    pub widgets_dir: Option<PathBuf>,
    /// Enables the response cache on GET routes
    pub cache: bool,
    pub redis: Option<Value>,
    /// Static asset max-age in milliseconds
    pub max_age: Option<u64>,
    pub csrf_whitelist: Vec<String>,
    /// Enables request logging
    pub log: bool,
    /// Boot without loading routes or listening
    pub serverless: bool,
    pub env: Option<String>,
    pub middleware: MiddlewareFlags,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PORT,
            ip_address: None,
            secret: None,
            db: DbConfig::default(),
            root_dir: PathBuf::from("."),
            uploads_dir: None,
            views_dir: None,
            models_dir: None,
            collections_dir: None,
            controllers_dir: None,
            plugins_dir: None,
            routes_dir: None,
            widgets_dir: None,
            cache: false,
            redis: None,
            max_age: None,
            csrf_whitelist: Vec::new(),
            log: false,
            serverless: false,
            env: None,
            middleware: MiddlewareFlags::default(),
        }
    }
}

impl AppConfig {
    /// Directory for a module kind: the configured override, else `{rootDir}/{kind}`.
    pub fn module_dir(&self, kind: ModuleKind) -> PathBuf {
        let override_dir = match kind {
            ModuleKind::Models => &self.models_dir,
            ModuleKind::Collections => &self.collections_dir,
            ModuleKind::Controllers => &self.controllers_dir,
            ModuleKind::Plugins => &self.plugins_dir,
            ModuleKind::Routes => &self.routes_dir,
            ModuleKind::Widgets => &self.widgets_dir,
        };
        override_dir
            .clone()
            .unwrap_or_else(|| self.root_dir.join(kind.default_dir_name()))
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.root_dir.join(constants::UPLOADS_DIR))
    }

    pub fn views_dir(&self) -> PathBuf {
        self.views_dir
            .clone()
            .unwrap_or_else(|| self.root_dir.join(constants::VIEWS_DIR))
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root_dir.join(constants::PUBLIC_DIR)
    }

    pub fn static_max_age(&self) -> Duration {
        Duration::from_millis(self.max_age.unwrap_or(constants::DEFAULT_STATIC_MAX_AGE_MS))
    }

    /// Response cache lifetime, read from `redis.expire` (seconds).
    pub fn cache_expire(&self) -> Duration {
        let secs = self
            .redis
            .as_ref()
            .and_then(|redis| redis.get("expire"))
            .and_then(Value::as_u64)
            .unwrap_or(constants::DEFAULT_CACHE_EXPIRE_SECS);
        Duration::from_secs(secs)
    }

    pub fn environment(&self) -> &str {
        self.env.as_deref().unwrap_or("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment() == "development"
    }

    /// The listening port; `PORT` in the process environment wins over `port`.
    pub fn resolve_port(&self) -> u16 {
        std::env::var(constants::PORT_ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.port)
    }

    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.ip_address.as_deref().unwrap_or(constants::DEFAULT_IP_ADDRESS),
            self.resolve_port()
        )
    }
}
