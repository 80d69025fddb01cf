use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::MethodRouter;
use axum::{Extension, Router};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::Layer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::kernel::services::Services;
use crate::routing::args::{normalize, RouteArgs, RouteDefinition, Verb};
use crate::routing::cache::ResponseCache;
use crate::routing::csrf::csrf_middleware;
use crate::routing::error::{HttpError, RouteError};
use crate::routing::forms::forms_middleware;
use crate::routing::handler::{Handler, Next, Request, Response};
use crate::routing::upload::{upload_middleware, UploadHandler};

/// Largest body the forms middleware buffers
const FORM_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The axum-backed HTTP engine.
///
/// Owns the route table and the built-in middleware derived from
/// configuration, and knows which kernel middleware each verb receives.
pub struct HttpEngine {
    config: Arc<AppConfig>,
    uploader: Arc<dyn UploadHandler>,
    cache: Option<Arc<dyn ResponseCache>>,
    builtins: Vec<Handler>,
    routes: Vec<RouteDefinition>,
}

impl HttpEngine {
    pub fn new(
        config: Arc<AppConfig>,
        uploader: Arc<dyn UploadHandler>,
        cache: Option<Arc<dyn ResponseCache>>,
    ) -> Self {
        let mut builtins = Vec::new();
        let flags = &config.middleware;

        if flags.enable_sessions {
            log::warn!("enableSessions is set but no session store is configured; continuing without sessions");
        }
        if flags.enable_forms {
            builtins.push(forms_middleware(flags.input_validation, FORM_BODY_LIMIT));
            if flags.enable_csrf {
                builtins.push(csrf_middleware(config.csrf_whitelist.clone()));
            }
        } else if flags.enable_csrf {
            log::warn!("enableCSRF requires enableForms; CSRF protection is disabled");
        }

        Self {
            config,
            uploader,
            cache,
            builtins,
            routes: Vec::new(),
        }
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// Built-in middleware run ahead of every route, in order
    pub fn builtins(&self) -> &[Handler] {
        &self.builtins
    }

    /// Middleware the kernel splices into routes of `verb`, if any.
    pub fn kernel_middleware(&self, verb: Verb) -> Option<Handler> {
        match verb {
            Verb::Post => Some(upload_middleware(self.uploader.clone())),
            Verb::Get if self.config.cache => self.cache.as_ref().map(|cache| cache.route()),
            Verb::Get => None,
        }
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResponseCache>> {
        self.cache.as_ref()
    }

    /// Normalize `args` for `verb` and add the route.
    pub fn add_route(&mut self, verb: Verb, path: &str, args: RouteArgs) -> Result<&RouteDefinition, RouteError> {
        let kernel = self.kernel_middleware(verb);
        let chain = normalize(args, kernel.as_ref());
        let route = RouteDefinition::new(verb, path, chain)?;
        if let Some(existing) = self.routes.iter().find(|known| known.conflicts_with(&route)) {
            return Err(RouteError::Conflict {
                verb: route.verb.to_string(),
                path: route.path,
                existing: existing.path.clone(),
            });
        }
        log::debug!("Route {} {} -> {:?}", route.verb, route.path, route.handler_names());
        self.routes.push(route);
        Ok(&self.routes[self.routes.len() - 1])
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Build the router.
    ///
    /// Each endpoint runs `builtins`, then `middleware`, then the route's own
    /// chain. Routes sharing a verb and router path are concatenated so an
    /// earlier chain can fall through into a later one. Unmatched paths are
    /// served from the public directory.
    pub fn router(&self, middleware: &[Handler], services: Services) -> Router {
        let mut grouped: BTreeMap<&str, BTreeMap<Verb, Vec<Handler>>> = BTreeMap::new();
        for route in &self.routes {
            grouped
                .entry(route.router_path())
                .or_default()
                .entry(route.verb)
                .or_default()
                .extend(route.chain.iter().cloned());
        }

        let verbose = self.config.is_development();
        let mut router = Router::new();
        for (path, verbs) in grouped {
            let mut method_router: MethodRouter = MethodRouter::new();
            for (verb, chain) in verbs {
                let full: Arc<[Handler]> = self
                    .builtins
                    .iter()
                    .chain(middleware.iter())
                    .cloned()
                    .chain(chain)
                    .collect();
                let endpoint = move |request: Request| dispatch(full.clone(), request, verbose);
                method_router = match verb {
                    Verb::Get => method_router.get(endpoint),
                    Verb::Post => method_router.post(endpoint),
                };
            }
            router = router.route(path, method_router);
        }

        let max_age = self.config.static_max_age().as_secs();
        let cache_control = HeaderValue::from_str(&format!("public, max-age={}", max_age))
            .unwrap_or_else(|_| HeaderValue::from_static("public"));
        let statics = SetResponseHeaderLayer::overriding(CACHE_CONTROL, cache_control)
            .layer(ServeDir::new(self.config.public_dir()));

        let router = router.fallback_service(statics).layer(Extension(services));
        if self.config.log {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        }
    }
}

/// Run `chain` for one request and render any error it yields.
pub async fn dispatch(chain: Arc<[Handler]>, request: Request, verbose: bool) -> Response {
    match Next::new(chain).run(request).await {
        Ok(response) => response,
        Err(error) => render_error(&error, verbose),
    }
}

/// The error-handling stage.
///
/// Verbose mode (development) renders the full source chain; otherwise the
/// status and top-level message are returned.
pub fn render_error(error: &HttpError, verbose: bool) -> Response {
    let status = error.status();
    if status.is_server_error() {
        log::error!("Request failed: {}", error);
    } else {
        log::debug!("Request rejected with {}: {}", status, error);
    }

    if !verbose {
        return (status, error.to_string()).into_response();
    }

    let mut body = format!("{} {}\n\nError: {}", status.as_u16(), status.canonical_reason().unwrap_or(""), error);
    let mut source = error.source();
    while let Some(cause) = source {
        body.push_str(&format!("\nCaused by: {}", cause));
        source = cause.source();
    }
    (status, body).into_response()
}

/// A running server. Dropping the handle stops the server.
pub struct ServerHandle {
    address: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// The bound address, with the real port when `0` was requested
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> Result<(), RouteError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        join(self.task).await
    }

    /// Wait until the server task ends.
    pub async fn wait(self) -> Result<(), RouteError> {
        let ServerHandle { task, shutdown, .. } = self;
        let result = join(task).await;
        drop(shutdown);
        result
    }
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("address", &self.address)
            .field("running", &!self.task.is_finished())
            .finish()
    }
}

async fn join(task: JoinHandle<io::Result<()>>) -> Result<(), RouteError> {
    match task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(RouteError::Serve(e.to_string())),
        Err(e) => Err(RouteError::Serve(e.to_string())),
    }
}

/// Bind `address` and serve `router` on a background task.
pub async fn listen(router: Router, address: &str) -> Result<ServerHandle, RouteError> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| RouteError::Bind {
            address: address.to_string(),
            source,
        })?;
    let bound = listener.local_addr().map_err(|source| RouteError::Bind {
        address: address.to_string(),
        source,
    })?;

    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
    });

    Ok(ServerHandle {
        address: bound,
        shutdown: Some(tx),
        task,
    })
}
