use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::registry::component::ComponentKind;
use crate::registry::error::RegistryError;
use crate::routing::{Handler, HandlerResult, HttpError, Request};

/// A request-handling controller.
///
/// A fresh instance is built by its [`ControllerFactory`] for every call, so
/// per-request state can live on `self`. Action names are declared up front by
/// [`methods`](Controller::methods) which lets callers inspect capabilities without
/// constructing anything.
pub trait Controller: Send + 'static {
    /// Names of the actions this controller answers to.
    fn methods() -> &'static [&'static str]
    where
        Self: Sized;

    /// Run `method` against `request`. `None` means the method does not exist.
    fn dispatch(self: Box<Self>, method: &str, request: Request) -> Option<BoxFuture<'static, HandlerResult>>;
}

type Constructor = dyn Fn() -> Box<dyn Controller> + Send + Sync;

/// Registered form of a controller: a zero-argument constructor plus its method table.
pub struct ControllerFactory {
    type_name: &'static str,
    methods: Vec<String>,
    constructor: Box<Constructor>,
}

impl ControllerFactory {
    /// Factory for a controller type built through `Default`.
    pub fn of<C: Controller + Default>() -> Self {
        Self {
            type_name: std::any::type_name::<C>(),
            methods: C::methods().iter().map(|m| m.to_string()).collect(),
            constructor: Box::new(|| Box::new(C::default())),
        }
    }

    /// Factory from an explicit constructor and method list.
    pub fn new<F>(methods: &[&str], constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Controller> + Send + Sync + 'static,
    {
        Self {
            type_name: "dyn Controller",
            methods: methods.iter().map(|m| m.to_string()).collect(),
            constructor: Box::new(constructor),
        }
    }

    /// A new controller instance.
    pub fn construct(&self) -> Box<dyn Controller> {
        (self.constructor)()
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Terminal route handler running `method` on a fresh instance per request.
    pub fn action(self: &Arc<Self>, name: &str, method: &str) -> Result<Handler, RegistryError> {
        if !self.has_method(method) {
            return Err(RegistryError::MethodNotFound {
                kind: ComponentKind::Controller,
                name: name.to_string(),
                method: method.to_string(),
            });
        }

        let factory = self.clone();
        let label = format!("{}#{}", name, method);
        let method = method.to_string();
        let controller_name = name.to_string();
        let handler = Handler::try_terminal(move |request: Request| {
            let controller = factory.construct();
            let dispatched = controller.dispatch(&method, request);
            let missing = format!("Controller<{}> declared '{}' but did not dispatch it", controller_name, method);
            async move {
                match dispatched {
                    Some(future) => future.await,
                    None => Err(HttpError::Internal(missing)),
                }
            }
        });
        Ok(handler.named(label))
    }
}

impl fmt::Debug for ControllerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerFactory")
            .field("type_name", &self.type_name)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Listing entry returned by `Application::get_controllers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerInfo {
    pub name: String,
    pub methods: Vec<String>,
}
