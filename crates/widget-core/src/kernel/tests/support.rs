use std::any::Any;
use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::ConfigData;
use crate::kernel::Application;
use crate::registry::{Controller, Plugin};
use crate::routing::{HandlerResult, Request};

#[derive(Default)]
pub struct PostsController;

impl Controller for PostsController {
    fn methods() -> &'static [&'static str] {
        &["index", "create"]
    }

    fn dispatch(self: Box<Self>, method: &str, _request: Request) -> Option<BoxFuture<'static, HandlerResult>> {
        match method {
            "index" => Some(Box::pin(async { Ok("all posts".into_response()) })),
            "create" => Some(Box::pin(async { Ok(StatusCode::CREATED.into_response()) })),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct AuditPlugin {
    pub label: String,
}

impl Plugin for AuditPlugin {
    fn name(&self) -> &str {
        "audit"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Configuration rooted at `root`, merged with `extra`.
pub fn config(root: &Path, extra: Value) -> ConfigData {
    let mut value = json!({
        "rootDir": root,
        "ipAddress": "127.0.0.1",
        "port": 0,
        "secret": "s3cret",
    });
    if let (Some(base), Value::Object(extra)) = (value.as_object_mut(), extra) {
        base.extend(extra);
    }
    ConfigData::from_value(value).expect("test config should be an object")
}

pub fn configured_app(root: &Path, extra: Value) -> Application {
    let mut app = Application::new();
    app.configure(config(root, extra)).expect("first configure should succeed");
    app
}

pub async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let request = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}
