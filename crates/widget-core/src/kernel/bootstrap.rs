use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use serde_json::Value;

use crate::config::{AppConfig, ConfigData, ConfigError, ConfigGate, ModuleKind};
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::kernel::manifest::{Manifest, Module};
use crate::kernel::services::{Services, TemplateHelper};
use crate::kernel::widgets::WidgetCatalog;
use crate::model::{bootstrap_persistence, Collection, CollectionDefinition, Model, ModelDefinition, Orm, Persistence};
use crate::registry::{
    downcast_plugin, ComponentKind, ComponentRegistry, Controller, ControllerFactory, ControllerInfo, Plugin,
    RegistryError,
};
use crate::routing::{
    DiskUploader, Handler, HttpEngine, MemoryResponseCache, ResponseCache, RouteArgs, RouteError, ServerHandle,
    UploadHandler, Verb,
};
use crate::utils::dir_has_entries;

/// Where the application is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    /// No configuration yet
    Unconfigured,
    /// Configuration accepted, startup not run
    Configured,
    /// Startup completed
    Started,
}

/// The composition root.
///
/// Owns the configuration gate, the four component registries and the HTTP
/// engine, and drives startup in a fixed order:
///
/// 1. persistence bootstrap
/// 2. model base
/// 3. models, then collections
/// 4. controller base
/// 5. HTTP engine
/// 6. plugins, then controllers
/// 7. routes (skipped when `serverless`)
/// 8. widgets (skipped when `serverless`)
/// 9. listen (skipped when `serverless`)
///
/// A failing step aborts startup. The instance is then unusable and should
/// be dropped.
pub struct Application {
    state: KernelState,
    booted: bool,
    config: ConfigGate,
    middleware: Option<Vec<Handler>>,
    helpers: Option<BTreeMap<String, TemplateHelper>>,
    persistence: Option<Arc<dyn Persistence>>,
    orm: Option<Arc<Orm>>,
    services: Option<Services>,
    engine: Option<HttpEngine>,
    models: ComponentRegistry<Model>,
    collections: ComponentRegistry<Collection>,
    controllers: ComponentRegistry<ControllerFactory>,
    plugins: ComponentRegistry<dyn Plugin>,
    widgets: WidgetCatalog,
}

/// Outcome of [`Application::boot`], for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootSummary {
    pub models: Vec<String>,
    pub collections: Vec<String>,
    pub controllers: Vec<ControllerInfo>,
    pub plugins: Vec<String>,
    pub routes: usize,
    pub widgets: Vec<String>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// An unconfigured application with the default sensitive-key denylist.
    pub fn new() -> Self {
        Self::with_config_gate(ConfigGate::with_denylist(constants::SENSITIVE_CONFIG_KEYS.iter().copied()))
    }

    /// An unconfigured application using `gate` for configuration access.
    pub fn with_config_gate(gate: ConfigGate) -> Self {
        Self {
            state: KernelState::Unconfigured,
            booted: false,
            config: gate,
            middleware: None,
            helpers: None,
            persistence: None,
            orm: None,
            services: None,
            engine: None,
            models: ComponentRegistry::new(ComponentKind::Model),
            collections: ComponentRegistry::new(ComponentKind::Collection),
            controllers: ComponentRegistry::new(ComponentKind::Controller),
            plugins: ComponentRegistry::new(ComponentKind::Plugin),
            widgets: WidgetCatalog::new(),
        }
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    // --- configuration ---

    /// Accept the configuration. Only the first call succeeds.
    pub fn configure(&mut self, data: ConfigData) -> Result<Arc<AppConfig>> {
        let settings = self.config.set(data)?;
        log::info!("Configuring {} v{}", constants::APP_NAME, constants::APP_VERSION);
        self.middleware = Some(Vec::new());
        self.helpers = Some(BTreeMap::new());
        self.state = KernelState::Configured;
        Ok(settings)
    }

    /// Typed configuration; fails with `NotSet` before [`configure`](Self::configure).
    pub fn settings(&self) -> Result<Arc<AppConfig>> {
        Ok(self.config.require()?)
    }

    /// Raw value at `key`; sensitive keys always read as absent.
    pub fn get_config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Change an existing key. Returns `false`, changing nothing, when `key` was never set.
    ///
    /// The HTTP engine keeps the configuration it was built with.
    pub fn update_config<T: Serialize>(&mut self, key: &str, value: T) -> Result<bool> {
        Ok(self.config.update(key, value)?)
    }

    /// Add application middleware run before every route.
    pub fn register_middleware(&mut self, handler: Handler) -> Result<()> {
        let middleware = self.middleware.as_mut().ok_or(ConfigError::NotSet)?;
        log::debug!("Registered middleware '{}'", handler.name());
        middleware.push(handler);
        Ok(())
    }

    /// Add a template helper.
    pub fn register_helper<F>(&mut self, name: &str, helper: F) -> Result<()>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let helpers = self.helpers.as_mut().ok_or(ConfigError::NotSet)?;
        helpers.insert(name.to_string(), Arc::new(helper));
        Ok(())
    }

    /// Registered helper names, sorted
    pub fn helpers(&self) -> Vec<String> {
        self.helpers
            .as_ref()
            .map(|helpers| helpers.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn middleware(&self) -> &[Handler] {
        self.middleware.as_deref().unwrap_or(&[])
    }

    // --- registries ---

    /// Register a model. Needs the model base from startup.
    pub fn add_model(&mut self, name: &str, definition: ModelDefinition) -> Result<Arc<Model>> {
        let orm = self
            .orm
            .clone()
            .ok_or_else(|| Error::not_ready(KernelLifecyclePhase::ModelBase, "Model base"))?;
        if self.models.contains(name) {
            return Err(RegistryError::DuplicateName {
                kind: ComponentKind::Model,
                name: name.to_string(),
            }
            .into());
        }
        for column in definition.unique_columns() {
            orm.store().declare_unique(definition.table(), column)?;
        }
        let model = Arc::new(Model::new(name, definition, orm));
        Ok(self.models.register(name, model)?)
    }

    pub fn get_model(&self, name: &str) -> Result<Arc<Model>> {
        Ok(self.models.get(name)?)
    }

    /// Register a collection over the model it names.
    pub fn add_collection(&mut self, name: &str, definition: CollectionDefinition) -> Result<Arc<Collection>> {
        let model = self.models.get(definition.model_name())?;
        let collection = Arc::new(Collection::new(name, &definition, model));
        Ok(self.collections.register(name, collection)?)
    }

    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>> {
        Ok(self.collections.get(name)?)
    }

    pub fn add_controller(&mut self, name: &str, factory: ControllerFactory) -> Result<Arc<ControllerFactory>> {
        Ok(self.controllers.register(name, Arc::new(factory))?)
    }

    /// A freshly constructed instance of controller `name`.
    pub fn get_controller(&self, name: &str) -> Result<Box<dyn Controller>> {
        Ok(self.controllers.lookup(name)?.construct())
    }

    /// Whether controller `name` exposes `method`, without constructing it.
    pub fn has_controller(&self, name: &str, method: &str) -> bool {
        self.controllers
            .lookup(name)
            .map(|factory| factory.has_method(method))
            .unwrap_or(false)
    }

    /// Controllers in registration order with their methods
    pub fn get_controllers(&self) -> Vec<ControllerInfo> {
        self.controllers
            .iter()
            .map(|(name, factory)| ControllerInfo {
                name: name.to_string(),
                methods: factory.methods().to_vec(),
            })
            .collect()
    }

    /// Route handler running `method` of controller `controller`.
    pub fn action(&self, controller: &str, method: &str) -> Result<Handler> {
        let factory = self.controllers.lookup(controller)?;
        Ok(factory.action(controller, method)?)
    }

    pub fn get_plugin(&self, name: &str) -> Result<Arc<dyn Plugin>> {
        Ok(self.plugins.get(name)?)
    }

    /// Plugin `name` as its concrete type, if it has that type.
    pub fn get_plugin_as<P: Plugin>(&self, name: &str) -> Option<&P> {
        self.plugins.lookup(name).ok().and_then(downcast_plugin::<P>)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.names().map(str::to_string).collect()
    }

    pub fn persistence(&self) -> Option<&Arc<dyn Persistence>> {
        self.persistence.as_ref()
    }

    pub fn orm(&self) -> Option<&Arc<Orm>> {
        self.orm.as_ref()
    }

    pub fn widgets(&self) -> &WidgetCatalog {
        &self.widgets
    }

    // --- routing ---

    /// Register a GET route: `(path, handler)` or `(path, middleware | [middleware], handler)`.
    pub fn get(&mut self, path: &str, args: impl Into<RouteArgs>) -> Result<()> {
        self.route(Verb::Get, path, args.into())
    }

    /// Register a POST route; multipart bodies go through the uploader first.
    pub fn post(&mut self, path: &str, args: impl Into<RouteArgs>) -> Result<()> {
        self.route(Verb::Post, path, args.into())
    }

    fn route(&mut self, verb: Verb, path: &str, args: RouteArgs) -> Result<()> {
        let engine = self.engine.as_mut().ok_or(RouteError::EngineNotReady)?;
        engine.add_route(verb, path, args)?;
        Ok(())
    }

    pub fn engine(&self) -> Option<&HttpEngine> {
        self.engine.as_ref()
    }

    /// The application router with the current registries attached.
    pub fn router(&self) -> Result<Router> {
        let engine = self.engine.as_ref().ok_or(RouteError::EngineNotReady)?;
        let services = self
            .services
            .clone()
            .ok_or_else(|| Error::not_ready(KernelLifecyclePhase::ControllerBase, "Controller base"))?
            .with_components(
                self.models.clone(),
                self.collections.clone(),
                self.widgets.clone(),
                self.helpers.clone().unwrap_or_default(),
            );
        Ok(engine.router(self.middleware(), services))
    }

    // --- lifecycle ---

    /// Run every startup step except listen.
    pub async fn boot(&mut self, manifest: Manifest) -> Result<BootSummary> {
        if self.state == KernelState::Unconfigured {
            return Err(Error::lifecycle(
                KernelLifecyclePhase::Configure,
                "Application must be configured before it is started",
                Some(ConfigError::NotSet.into()),
            ));
        }
        if self.booted {
            return Err(Error::lifecycle(
                KernelLifecyclePhase::Configure,
                "Application has already been started",
                None,
            ));
        }
        self.booted = true;

        let settings = self.settings()?;
        let Manifest {
            models,
            collections,
            controllers,
            routes,
            plugins,
            widget_middleware,
            persistence,
            uploader,
            cache,
        } = manifest;

        log::info!("Bootstrapping persistence...");
        let store = bootstrap_persistence(&settings.db, persistence).map_err(|e| {
            Error::lifecycle(
                KernelLifecyclePhase::PersistenceBootstrap,
                "Persistence engine failed to start",
                Some(e.into()),
            )
        })?;
        self.persistence = Some(store.clone());

        log::info!("Initializing model base...");
        self.orm = Some(Arc::new(Orm::new(store)));

        self.load_modules(KernelLifecyclePhase::LoadModels, ModuleKind::Models, models)?;
        self.load_modules(KernelLifecyclePhase::LoadCollections, ModuleKind::Collections, collections)?;

        log::info!("Initializing controller base...");
        let orm = self
            .orm
            .clone()
            .ok_or_else(|| Error::not_ready(KernelLifecyclePhase::ControllerBase, "Model base"))?;
        self.services = Some(Services::new(settings.clone(), orm));

        log::info!("Initializing server...");
        let uploader: Arc<dyn UploadHandler> =
            uploader.unwrap_or_else(|| Arc::new(DiskUploader::new(settings.uploads_dir())));
        let cache: Option<Arc<dyn ResponseCache>> = match cache {
            Some(cache) => Some(cache),
            None if settings.cache => Some(Arc::new(MemoryResponseCache::new(settings.cache_expire()))),
            None => None,
        };
        self.engine = Some(HttpEngine::new(settings.clone(), uploader, cache));

        self.load_plugins(&settings, plugins)?;
        self.load_modules(KernelLifecyclePhase::LoadControllers, ModuleKind::Controllers, controllers)?;

        if settings.serverless {
            log::warn!("Serverless mode: skipping routes, widgets and listen");
        } else {
            self.load_modules(KernelLifecyclePhase::LoadRoutes, ModuleKind::Routes, routes)?;
            self.load_widgets(&settings, widget_middleware)?;
        }

        self.state = KernelState::Started;
        Ok(self.summary())
    }

    /// Run startup and, unless serverless, bind the listener.
    pub async fn start(&mut self, manifest: Manifest) -> Result<Option<ServerHandle>> {
        self.boot(manifest).await?;
        let settings = self.settings()?;
        if settings.serverless {
            return Ok(None);
        }

        let router = self.router()?;
        let address = settings.bind_address();
        let handle = crate::routing::listen(router, &address).await.map_err(|e| {
            Error::lifecycle(
                KernelLifecyclePhase::Listen,
                format!("Failed to listen on {}", address),
                Some(e.into()),
            )
        })?;
        log::info!(
            "Server listening on {} in {} mode",
            handle.address(),
            settings.environment()
        );
        Ok(Some(handle))
    }

    fn load_modules(&mut self, phase: KernelLifecyclePhase, kind: ModuleKind, modules: Vec<Module>) -> Result<()> {
        log::info!("Loading {}...", kind);
        if modules.is_empty() {
            let dir = self.settings()?.module_dir(kind);
            if dir_has_entries(&dir) {
                log::warn!("{} has entries but no {} are registered", dir.display(), kind);
            }
            return Ok(());
        }

        let count = modules.len();
        for module in modules {
            let (name, load) = module.into_parts();
            log::debug!("Loading {} module '{}'", kind, name);
            load(self).map_err(|e| Error::lifecycle(phase, format!("Failed to load {} module '{}'", kind, name), Some(e)))?;
        }
        log::info!("Loaded {} {} module(s)", count, kind);
        Ok(())
    }

    fn load_plugins(&mut self, settings: &AppConfig, factories: Vec<crate::registry::PluginFactory>) -> Result<()> {
        log::info!("Loading plugins...");
        for factory in factories {
            let plugin = factory(settings)
                .map_err(|e| Error::lifecycle(KernelLifecyclePhase::LoadPlugins, "Plugin factory failed", Some(e)))?;
            let name = plugin.name().to_string();
            self.plugins.register(name.clone(), plugin).map_err(|e| {
                Error::lifecycle(
                    KernelLifecyclePhase::LoadPlugins,
                    format!("Failed to register plugin '{}'", name),
                    Some(e.into()),
                )
            })?;
            log::info!("Plugin '{}' loaded", name);
        }
        Ok(())
    }

    fn load_widgets(&mut self, settings: &AppConfig, middleware: Vec<Handler>) -> Result<()> {
        let dir = settings.module_dir(ModuleKind::Widgets);
        if !dir_has_entries(&dir) && middleware.is_empty() {
            log::warn!("No widgets found in {}; skipping widget step", dir.display());
            return Ok(());
        }

        log::info!("Loading widgets...");
        if dir_has_entries(&dir) {
            self.widgets = WidgetCatalog::scan(&dir).map_err(|e| {
                Error::lifecycle(KernelLifecyclePhase::LoadWidgets, "Failed to scan widgets", Some(e))
            })?;
            log::info!("Loaded {} widget template(s)", self.widgets.len());
        }
        if let Some(global) = self.middleware.as_mut() {
            global.extend(middleware);
        }
        Ok(())
    }

    /// Current registry contents
    pub fn summary(&self) -> BootSummary {
        BootSummary {
            models: self.models.names().map(str::to_string).collect(),
            collections: self.collections.names().map(str::to_string).collect(),
            controllers: self.get_controllers(),
            plugins: self.plugin_names(),
            routes: self.engine.as_ref().map(|e| e.routes().len()).unwrap_or(0),
            widgets: self.widgets.names().map(str::to_string).collect(),
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("state", &self.state)
            .field("models", &self.models)
            .field("collections", &self.collections)
            .field("controllers", &self.controllers)
            .field("plugins", &self.plugins)
            .finish()
    }
}
