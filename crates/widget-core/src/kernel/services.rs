use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::AppConfig;
use crate::kernel::widgets::WidgetCatalog;
use crate::model::{Collection, Model, Orm};
use crate::registry::{ComponentKind, ComponentRegistry, RegistryError};
use crate::routing::{HttpError, Request};

/// A template helper function exposed to the template engine.
pub type TemplateHelper = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Shared handles available to every handler through a request extension.
///
/// Created with the configuration and model base during startup; the
/// registries, widgets and helpers are attached when the router is built.
#[derive(Clone)]
pub struct Services {
    config: Arc<AppConfig>,
    orm: Arc<Orm>,
    models: Arc<ComponentRegistry<Model>>,
    collections: Arc<ComponentRegistry<Collection>>,
    widgets: Arc<WidgetCatalog>,
    helpers: Arc<BTreeMap<String, TemplateHelper>>,
}

impl Services {
    pub fn new(config: Arc<AppConfig>, orm: Arc<Orm>) -> Self {
        Self {
            config,
            orm,
            models: Arc::new(ComponentRegistry::new(ComponentKind::Model)),
            collections: Arc::new(ComponentRegistry::new(ComponentKind::Collection)),
            widgets: Arc::new(WidgetCatalog::new()),
            helpers: Arc::new(BTreeMap::new()),
        }
    }

    pub(crate) fn with_components(
        mut self,
        models: ComponentRegistry<Model>,
        collections: ComponentRegistry<Collection>,
        widgets: WidgetCatalog,
        helpers: BTreeMap<String, TemplateHelper>,
    ) -> Self {
        self.models = Arc::new(models);
        self.collections = Arc::new(collections);
        self.widgets = Arc::new(widgets);
        self.helpers = Arc::new(helpers);
        self
    }

    /// The handles attached to `request` by the engine.
    pub fn from_request(request: &Request) -> Result<&Services, HttpError> {
        request
            .extensions()
            .get::<Services>()
            .ok_or_else(|| HttpError::Internal("Services extension missing from request".to_string()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn orm(&self) -> &Arc<Orm> {
        &self.orm
    }

    pub fn model(&self, name: &str) -> Result<Arc<Model>, RegistryError> {
        self.models.get(name)
    }

    pub fn collection(&self, name: &str) -> Result<Arc<Collection>, RegistryError> {
        self.collections.get(name)
    }

    pub fn widgets(&self) -> &WidgetCatalog {
        &self.widgets
    }

    pub fn helper(&self, name: &str) -> Option<&TemplateHelper> {
        self.helpers.get(name)
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("orm", &self.orm)
            .field("models", &self.models)
            .field("collections", &self.collections)
            .field("widgets", &self.widgets.len())
            .field("helpers", &self.helpers.keys().collect::<Vec<_>>())
            .finish()
    }
}
