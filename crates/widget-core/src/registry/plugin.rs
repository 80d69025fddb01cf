use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::kernel::error::Result;

/// An application plugin.
///
/// Plugins are produced by a [`PluginFactory`] that receives the typed
/// configuration; the returned value's [`name`](Plugin::name) is its registry key.
pub trait Plugin: Any + Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Builds a plugin from the application configuration.
pub type PluginFactory = Box<dyn FnOnce(&AppConfig) -> Result<Arc<dyn Plugin>> + Send>;

/// Concrete view of a registered plugin, if it is a `P`.
pub fn downcast_plugin<P: Plugin>(plugin: &Arc<dyn Plugin>) -> Option<&P> {
    plugin.as_any().downcast_ref::<P>()
}
