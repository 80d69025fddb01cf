use std::path::Path;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::ConfigData;
use crate::kernel::{Application, Manifest, Services};
use crate::model::{Attributes, CollectionDefinition, LifecyclePhase, ModelDefinition, ModelError, ModelHooks, ModelInstance, SaveOptions};
use crate::registry::Controller;
use crate::routing::{FormData, HandlerResult, HttpError, Request, UploadedFiles};

pub const BOUNDARY: &str = "BLOGBOUNDARY";

/// Posts get a slug from their title when first created
pub struct PostHooks;

#[async_trait]
impl ModelHooks for PostHooks {
    fn overrides(&self) -> &[LifecyclePhase] {
        &[LifecyclePhase::Creating]
    }

    async fn creating(&self, post: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        let title = post
            .get_str("title")
            .ok_or_else(|| ModelError::hook(LifecyclePhase::Creating, "title is required"))?
            .to_string();
        let slug = post.generate_slug(&title).await?;
        post.set("slug", slug);
        Ok(())
    }
}

#[derive(Default)]
pub struct PostsController;

impl PostsController {
    async fn index(request: Request) -> HandlerResult {
        let services = Services::from_request(&request)?.clone();
        let feed = services.collection("Feed")?;
        let page = feed.fetch_page(1, 0).await?;
        let posts: Vec<Value> = page.models.iter().map(|post| post.pick(&["title", "slug"])).collect();
        Ok(Json(json!({ "posts": posts, "pagination": page.pagination })).into_response())
    }

    async fn create(request: Request) -> HandlerResult {
        let services = Services::from_request(&request)?.clone();
        let title = request
            .extensions()
            .get::<FormData>()
            .and_then(|form| form.get("title"))
            .map(str::to_string)
            .ok_or_else(|| HttpError::bad_request("title is required"))?;
        let image = request
            .extensions()
            .get::<UploadedFiles>()
            .and_then(|files| files.0.first())
            .map(|file| file.file_name.clone());

        let mut post = services.model("Post")?.forge(Attributes::new());
        post.set("title", title);
        if let Some(image) = image {
            post.set("image", image);
        }
        post.save().await?;
        Ok((StatusCode::CREATED, Json(post.pick(&["title", "slug", "image"]))).into_response())
    }
}

impl Controller for PostsController {
    fn methods() -> &'static [&'static str] {
        &["index", "create"]
    }

    fn dispatch(self: Box<Self>, method: &str, request: Request) -> Option<BoxFuture<'static, HandlerResult>> {
        match method {
            "index" => Some(Box::pin(Self::index(request))),
            "create" => Some(Box::pin(Self::create(request))),
            _ => None,
        }
    }
}

pub fn blog_manifest() -> Manifest {
    Manifest::new()
        .model("Post", ModelDefinition::new("posts").with_hooks(PostHooks))
        .collection("Feed", CollectionDefinition::of("Post").with_page_size(5))
        .controller::<PostsController>("Posts")
        .routes("posts", |app| {
            let index = app.action("Posts", "index")?;
            app.get("/posts", index)?;
            let create = app.action("Posts", "create")?;
            app.post("/posts", create)
        })
}

pub async fn blog_app(root: &Path) -> Application {
    let config = ConfigData::from_value(json!({
        "rootDir": root,
        "env": "development",
        "middleware": { "enableForms": true },
    }))
    .expect("blog config should be an object");

    let mut app = Application::new();
    app.configure(config).expect("configure failed");
    app.boot(blog_manifest()).await.expect("boot failed");
    app
}

pub fn multipart_post(title: &str, image: Option<&[u8]>) -> Request {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n",
            b = BOUNDARY,
            title = title
        )
        .as_bytes(),
    );
    if let Some(data) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    axum::http::Request::builder()
        .method("POST")
        .uri("/posts")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

pub async fn call(router: &Router, request: Request) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::from(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}
