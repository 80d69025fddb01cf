use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::model::{CollectionDefinition, ModelDefinition, Persistence};
use crate::registry::{Controller, ControllerFactory, Plugin, PluginFactory};
use crate::routing::{Handler, ResponseCache, UploadHandler};

/// Loader for one application module, run during its startup step.
pub type ModuleLoader = Box<dyn FnOnce(&mut Application) -> Result<()> + Send>;

/// A named module registered in a [`Manifest`].
pub struct Module {
    name: String,
    load: ModuleLoader,
}

impl Module {
    pub fn new<F>(name: impl Into<String>, load: F) -> Self
    where
        F: FnOnce(&mut Application) -> Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            load: Box::new(load),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, ModuleLoader) {
        (self.name, self.load)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Module").field(&self.name).finish()
    }
}

/// Explicit list of everything the kernel loads at startup.
///
/// Each list is consumed by its own startup step, in the order the modules
/// were added. Collaborator overrides replace the defaults chosen from
/// configuration.
#[derive(Default)]
pub struct Manifest {
    pub(crate) models: Vec<Module>,
    pub(crate) collections: Vec<Module>,
    pub(crate) controllers: Vec<Module>,
    pub(crate) routes: Vec<Module>,
    pub(crate) plugins: Vec<PluginFactory>,
    pub(crate) widget_middleware: Vec<Handler>,
    pub(crate) persistence: Option<Arc<dyn Persistence>>,
    pub(crate) uploader: Option<Arc<dyn UploadHandler>>,
    pub(crate) cache: Option<Arc<dyn ResponseCache>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` as model `name`
    pub fn model(self, name: &str, definition: ModelDefinition) -> Self {
        let key = name.to_string();
        self.model_module(Module::new(name, move |app| app.add_model(&key, definition).map(|_| ())))
    }

    pub fn model_module(mut self, module: Module) -> Self {
        self.models.push(module);
        self
    }

    /// Register a collection `name` over an already registered model
    pub fn collection(self, name: &str, definition: CollectionDefinition) -> Self {
        let key = name.to_string();
        self.collection_module(Module::new(name, move |app| {
            app.add_collection(&key, definition).map(|_| ())
        }))
    }

    pub fn collection_module(mut self, module: Module) -> Self {
        self.collections.push(module);
        self
    }

    /// Register controller type `C` as `name`
    pub fn controller<C: Controller + Default>(self, name: &str) -> Self {
        let key = name.to_string();
        self.controller_module(Module::new(name, move |app| {
            app.add_controller(&key, ControllerFactory::of::<C>()).map(|_| ())
        }))
    }

    pub fn controller_module(mut self, module: Module) -> Self {
        self.controllers.push(module);
        self
    }

    /// A route module; its loader calls `Application::get`/`post`.
    pub fn routes<F>(mut self, name: &str, load: F) -> Self
    where
        F: FnOnce(&mut Application) -> Result<()> + Send + 'static,
    {
        self.routes.push(Module::new(name, load));
        self
    }

    /// A plugin factory; the plugin's own name becomes its registry key.
    pub fn plugin<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&AppConfig) -> Result<Arc<dyn Plugin>> + Send + 'static,
    {
        self.plugins.push(Box::new(factory));
        self
    }

    /// Middleware appended to the global chain by the widget step
    pub fn widget_middleware(mut self, handler: Handler) -> Self {
        self.widget_middleware.push(handler);
        self
    }

    pub fn persistence(mut self, store: Arc<dyn Persistence>) -> Self {
        self.persistence = Some(store);
        self
    }

    pub fn uploader(mut self, uploader: Arc<dyn UploadHandler>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("models", &self.models)
            .field("collections", &self.collections)
            .field("controllers", &self.controllers)
            .field("routes", &self.routes)
            .field("plugins", &self.plugins.len())
            .field("widget_middleware", &self.widget_middleware)
            .finish()
    }
}
