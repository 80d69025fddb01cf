/// Application name
pub const APP_NAME: &str = "Widget";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Port used when the configuration does not name one
pub const DEFAULT_PORT: u16 = 3000;

/// Bind address used when `ipAddress` is absent
pub const DEFAULT_IP_ADDRESS: &str = "0.0.0.0";

/// Environment variable that overrides the configured port
pub const PORT_ENV_VAR: &str = "PORT";

/// Persistence client served by the built-in in-memory store
pub const MEMORY_DB_CLIENT: &str = "memory";

/// Static asset directory, relative to `rootDir`
pub const PUBLIC_DIR: &str = "public";

/// Default upload directory, relative to `rootDir`
pub const UPLOADS_DIR: &str = "public/uploads";

/// Default views directory, relative to `rootDir`
pub const VIEWS_DIR: &str = "views";

/// Static asset max-age in milliseconds (one day)
pub const DEFAULT_STATIC_MAX_AGE_MS: u64 = 1000 * 60 * 60 * 24;

/// Response cache lifetime in seconds when `redis.expire` is absent
pub const DEFAULT_CACHE_EXPIRE_SECS: u64 = 60 * 60;

/// Configuration keys hidden from `get_config` by default
pub const SENSITIVE_CONFIG_KEYS: &[&str] = &["secret", "db", "redis"];

/// File extensions recognised as widget templates
pub const WIDGET_TEMPLATE_EXTENSIONS: &[&str] = &["hbs", "html"];

/// Name of the CSRF cookie and form field
pub const CSRF_COOKIE: &str = "_csrf";

/// Header carrying the CSRF token on write requests
pub const CSRF_HEADER: &str = "x-csrf-token";
