//! Route argument shapes and kernel-middleware splicing.
//!
//! Callers register routes as `(path, handler)`, `(path, middleware, handler)`
//! or `(path, [middleware...], handler)`. The shape is detected once here and
//! lowered into a flat handler chain; nothing downstream inspects arity again.
use std::fmt;

use crate::routing::error::RouteError;
use crate::routing::handler::Handler;

/// HTTP verbs the kernel exposes for route registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    /// Write verbs receive the upload middleware
    pub fn is_write(&self) -> bool {
        matches!(self, Verb::Post)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Get => f.write_str("GET"),
            Verb::Post => f.write_str("POST"),
        }
    }
}

/// One positional argument after the path.
#[derive(Debug, Clone)]
pub enum RouteArg {
    Handler(Handler),
    Handlers(Vec<Handler>),
}

impl From<Handler> for RouteArg {
    fn from(handler: Handler) -> Self {
        RouteArg::Handler(handler)
    }
}

impl From<Vec<Handler>> for RouteArg {
    fn from(handlers: Vec<Handler>) -> Self {
        RouteArg::Handlers(handlers)
    }
}

/// The positional arguments of a route registration, path excluded.
#[derive(Debug, Clone, Default)]
pub struct RouteArgs(Vec<RouteArg>);

impl RouteArgs {
    pub fn new(args: Vec<RouteArg>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn flatten(self) -> Vec<Handler> {
        self.0
            .into_iter()
            .flat_map(|arg| match arg {
                RouteArg::Handler(handler) => vec![handler],
                RouteArg::Handlers(handlers) => handlers,
            })
            .collect()
    }
}

impl From<Handler> for RouteArgs {
    fn from(handler: Handler) -> Self {
        RouteArgs(vec![RouteArg::Handler(handler)])
    }
}

impl From<(Handler, Handler)> for RouteArgs {
    fn from((middleware, handler): (Handler, Handler)) -> Self {
        RouteArgs(vec![RouteArg::Handler(middleware), RouteArg::Handler(handler)])
    }
}

impl From<(Vec<Handler>, Handler)> for RouteArgs {
    fn from((middlewares, handler): (Vec<Handler>, Handler)) -> Self {
        RouteArgs(vec![RouteArg::Handlers(middlewares), RouteArg::Handler(handler)])
    }
}

impl From<Vec<RouteArg>> for RouteArgs {
    fn from(args: Vec<RouteArg>) -> Self {
        RouteArgs(args)
    }
}

/// Lower `args` into a handler chain, splicing `kernel` in at its fixed position.
///
/// - one argument: `[kernel, handler]`
/// - two arguments, single middleware: `[middleware, kernel, handler]`
/// - two arguments, middleware list: `[middlewares..., kernel, handler]`
/// - any other count is flattened unchanged, without kernel middleware.
pub fn normalize(args: RouteArgs, kernel: Option<&Handler>) -> Vec<Handler> {
    let Some(kernel) = kernel else {
        return args.flatten();
    };

    let mut args = args.0;
    match args.len() {
        1 => {
            args.insert(0, RouteArg::Handler(kernel.clone()));
        }
        2 => {
            let first = args.remove(0);
            let spliced = match first {
                RouteArg::Handler(middleware) => vec![middleware, kernel.clone()],
                RouteArg::Handlers(mut middlewares) => {
                    middlewares.push(kernel.clone());
                    middlewares
                }
            };
            args.insert(0, RouteArg::Handlers(spliced));
        }
        count => {
            log::debug!("Route registered with {} handler arguments; kernel middleware not injected", count);
        }
    }
    RouteArgs(args).flatten()
}

/// A registered route: verb, path and its normalized chain.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    pub verb: Verb,
    pub path: String,
    pub chain: Vec<Handler>,
    router_path: String,
}

impl RouteDefinition {
    pub fn new(verb: Verb, path: impl Into<String>, chain: Vec<Handler>) -> Result<Self, RouteError> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath { path });
        }
        if chain.is_empty() {
            return Err(RouteError::EmptyChain {
                verb: verb.to_string(),
                path,
            });
        }
        let router_path = to_router_path(&path);
        check_pattern(&path, &router_path)?;
        Ok(Self {
            verb,
            path,
            chain,
            router_path,
        })
    }

    /// Names of the chain's handlers, in execution order
    pub fn handler_names(&self) -> Vec<&str> {
        self.chain.iter().map(Handler::name).collect()
    }

    /// The path in the router's `{param}` syntax.
    pub fn router_path(&self) -> &str {
        &self.router_path
    }

    /// Whether the router cannot hold both routes at once.
    ///
    /// That is the case when, after a shared prefix, both paths capture at the
    /// same position under a different name or kind. A literal segment next to
    /// a capture is fine; the literal wins at match time.
    pub fn conflicts_with(&self, other: &RouteDefinition) -> bool {
        let left = self.router_path.split('/').map(Segment::parse);
        let right = other.router_path.split('/').map(Segment::parse);
        for (a, b) in left.zip(right) {
            if a != b {
                return a.is_capture() && b.is_capture();
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        match raw.strip_prefix('{').and_then(|inner| inner.strip_suffix('}')) {
            Some(inner) => match inner.strip_prefix('*') {
                Some(name) => Segment::Wildcard(name),
                None => Segment::Param(inner),
            },
            None => Segment::Literal(raw),
        }
    }

    fn is_capture(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// Reject patterns the router would refuse to insert.
fn check_pattern(path: &str, router_path: &str) -> Result<(), RouteError> {
    let invalid = |reason: &str| RouteError::InvalidPattern {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    let segments: Vec<Segment<'_>> = router_path.split('/').map(Segment::parse).collect();
    let last = segments.len().saturating_sub(1);
    for (index, segment) in segments.iter().enumerate() {
        match *segment {
            Segment::Literal(text) => {
                if text.contains(['{', '}']) {
                    return Err(invalid("braces may only wrap a whole segment"));
                }
                if text.starts_with(':') {
                    return Err(invalid("a ':' capture needs a name"));
                }
            }
            Segment::Param(name) | Segment::Wildcard(name) => {
                if name.is_empty() || name.contains(['{', '}', '*']) {
                    return Err(invalid("capture names must be plain and non-empty"));
                }
                if name.ends_with('?') {
                    return Err(invalid("optional captures are not supported"));
                }
                if matches!(segment, Segment::Wildcard(_)) && index != last {
                    return Err(invalid("a wildcard must be the last segment"));
                }
            }
        }
    }
    Ok(())
}

/// Rewrite `:param` and `*` segments into the `{param}` and `{*name}`
/// captures the router expects.
pub fn to_router_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':').filter(|name| !name.is_empty()) {
                return format!("{{{}}}", name);
            }
            match segment.strip_prefix('*') {
                Some("") => "{*wildcard}".to_string(),
                Some(name) => format!("{{*{}}}", name),
                None => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
