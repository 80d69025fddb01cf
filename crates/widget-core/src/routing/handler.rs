use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::future::BoxFuture;

use crate::routing::error::HttpError;

/// Request type flowing through handler chains
pub type Request = axum::extract::Request;

/// Response type produced by handler chains
pub type Response = axum::response::Response;

/// Outcome of a handler; `Err` is forwarded to the error-handling stage.
pub type HandlerResult = Result<Response, HttpError>;

type HandlerFn = dyn Fn(Request, Next) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// One step of a route's middleware chain.
///
/// A handler receives the request plus a [`Next`] continuation. Middleware
/// calls `next.run(request)` to pass control on; a terminal handler ignores
/// `next` and produces the response itself. Returning `Err` skips the rest of
/// the chain.
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Middleware-shaped handler
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: Arc::from("anonymous"),
            func: Arc::new(move |request: Request, next: Next| -> BoxFuture<'static, HandlerResult> {
                Box::pin(func(request, next))
            }),
        }
    }

    /// Terminal handler whose output is any `IntoResponse`.
    pub fn terminal<F, Fut, R>(func: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::new(move |request: Request, _next: Next| {
            let fut = func(request);
            async move { Ok(fut.await.into_response()) }
        })
    }

    /// Terminal handler that can fail.
    pub fn try_terminal<F, Fut>(func: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(move |request: Request, _next: Next| func(request))
    }

    /// Label used in logs and chain inspection
    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Arc::from(name.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run this handler with an explicit continuation.
    pub fn call(&self, request: Request, next: Next) -> BoxFuture<'static, HandlerResult> {
        (self.func)(request, next)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

/// Continuation into the remainder of a handler chain.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Handler]>,
    index: usize,
}

impl Next {
    /// Continuation positioned at the start of `chain`
    pub fn new(chain: Arc<[Handler]>) -> Self {
        Self { chain, index: 0 }
    }

    /// Hand the request to the next handler. Running past the end yields 404.
    pub fn run(self, request: Request) -> BoxFuture<'static, HandlerResult> {
        match self.chain.get(self.index).cloned() {
            Some(handler) => {
                let next = Next {
                    chain: self.chain,
                    index: self.index + 1,
                };
                handler.call(request, next)
            }
            None => Box::pin(async { Ok(StatusCode::NOT_FOUND.into_response()) }),
        }
    }

    /// Handlers still ahead of this continuation
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}
