use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::routing::error::HttpError;
use crate::routing::handler::{Handler, Next, Request, Response};

/// Header set on responses served from the cache
pub const CACHE_HEADER: &str = "x-cache";

/// Boundary to the response-caching collaborator.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Middleware injected on read routes when caching is enabled.
    fn route(&self) -> Handler;

    /// Drop the entry stored under `name`, or everything for `"*"`.
    /// Returns the number of entries removed.
    async fn clear(&self, name: &str) -> usize;
}

#[derive(Clone)]
struct CachedResponse {
    headers: HeaderMap,
    body: Bytes,
    stored_at: Instant,
}

/// In-process cache of successful GET responses keyed by request URI.
#[derive(Clone)]
pub struct MemoryResponseCache {
    entries: Arc<Mutex<HashMap<String, CachedResponse>>>,
    ttl: Duration,
    body_limit: usize,
}

impl MemoryResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            body_limit: 8 * 1024 * 1024,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

fn replay(entry: &CachedResponse) -> Response {
    let mut response = Response::new(Body::from(entry.body.clone()));
    *response.headers_mut() = entry.headers.clone();
    response
        .headers_mut()
        .insert(CACHE_HEADER, HeaderValue::from_static("hit"));
    response
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    fn route(&self) -> Handler {
        let cache = self.clone();
        Handler::new(move |request: Request, next: Next| {
            let cache = cache.clone();
            async move {
                if request.method() != Method::GET {
                    return next.run(request).await;
                }

                let key = request.uri().to_string();
                {
                    let mut entries = cache.entries.lock().await;
                    match entries.get(&key).map(|entry| entry.stored_at.elapsed() < cache.ttl) {
                        Some(true) => {
                            if let Some(entry) = entries.get(&key) {
                                log::debug!("Cache hit for {}", key);
                                return Ok(replay(entry));
                            }
                        }
                        Some(false) => {
                            entries.remove(&key);
                        }
                        None => {}
                    }
                }

                let response = next.run(request).await?;
                if response.status() != StatusCode::OK {
                    return Ok(response);
                }

                let (parts, body) = response.into_parts();
                let bytes = to_bytes(body, cache.body_limit)
                    .await
                    .map_err(|e| HttpError::Internal(format!("Failed to buffer response for cache: {}", e)))?;
                cache.entries.lock().await.insert(
                    key,
                    CachedResponse {
                        headers: parts.headers.clone(),
                        body: bytes.clone(),
                        stored_at: Instant::now(),
                    },
                );
                Ok(Response::from_parts(parts, Body::from(bytes)))
            }
        })
        .named("cache")
    }

    async fn clear(&self, name: &str) -> usize {
        let mut entries = self.entries.lock().await;
        if name == "*" {
            let removed = entries.len();
            entries.clear();
            return removed;
        }
        usize::from(entries.remove(name).is_some())
    }
}
