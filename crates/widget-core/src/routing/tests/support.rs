use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, StatusCode};
use axum::Router;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::kernel::Services;
use crate::model::{MemoryStore, Orm};
use crate::routing::{Handler, HttpEngine, Next, Request, ResponseCache, UploadError, UploadHandler};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Middleware that records `name` and continues
pub fn recorder(name: &'static str, log: CallLog) -> Handler {
    Handler::new(move |request: Request, next: Next| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(name.to_string());
            next.run(request).await
        }
    })
    .named(name)
}

/// Terminal handler that records "handler" and answers "done"
pub fn terminal(log: CallLog) -> Handler {
    Handler::terminal(move |_request: Request| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push("handler".to_string());
            "done"
        }
    })
    .named("handler")
}

pub struct RecordingUploader {
    pub log: CallLog,
}

#[async_trait]
impl UploadHandler for RecordingUploader {
    async fn handle(&self, request: Request) -> Result<Request, UploadError> {
        self.log.lock().unwrap().push("upload".to_string());
        Ok(request)
    }
}

pub struct FailingUploader;

#[async_trait]
impl UploadHandler for FailingUploader {
    async fn handle(&self, _request: Request) -> Result<Request, UploadError> {
        Err(UploadError::Rejected("disk full".to_string()))
    }
}

pub fn engine(config: AppConfig, uploader: Arc<dyn UploadHandler>, cache: Option<Arc<dyn ResponseCache>>) -> HttpEngine {
    HttpEngine::new(Arc::new(config), uploader, cache)
}

pub fn services(engine: &HttpEngine) -> Services {
    Services::new(engine.config().clone(), Arc::new(Orm::new(Arc::new(MemoryStore::new()))))
}

pub fn router(engine: &HttpEngine) -> Router {
    engine.router(&[], services(engine))
}

pub fn multipart_body(boundary: &str, file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"title\"\r\n\r\nHello world\r\n");
    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

pub fn multipart_request(uri: &str) -> Request {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(multipart_body("XBOUNDARY", None)))
        .unwrap()
}

pub fn json_request(uri: &str, json: &str) -> Request {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request {
    axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(router: Router, request: Request) -> (StatusCode, HeaderMap, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}
