use axum::body::Body;
use axum::http::StatusCode;
use serde_json::json;
use tempfile::tempdir;

use crate::routing::Request;
use crate::tests::integration::common::{blog_app, call, multipart_post};

#[tokio::test]
async fn test_create_and_list_posts() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let app = blog_app(dir.path()).await;
    let router = app.router().expect("router failed");

    let (status, first) = call(&router, multipart_post("Qué! Mlilo", Some(&b"\x89PNG"[..]))).await;
    assert_eq!(status, StatusCode::CREATED, "Body: {}", first);
    assert_eq!(first["title"], json!("Qué! Mlilo"));
    assert_eq!(first["slug"], json!("que-mlilo"));
    let image = first["image"].as_str().expect("image file name").to_string();
    assert!(dir.path().join("public/uploads").join(&image).is_file());

    let (status, second) = call(&router, multipart_post("Que Mlilo", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["slug"], json!("que-mlilo-2"));
    assert!(second["image"].is_null());

    let request = axum::http::Request::builder().uri("/posts").body(Body::empty()).unwrap();
    let (status, listing) = call(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"], json!({ "page": 1, "pageSize": 5, "rowCount": 2, "pageCount": 1 }));
    assert_eq!(listing["posts"][1]["slug"], json!("que-mlilo-2"));
}

#[tokio::test]
async fn test_reserved_title_gets_owner_suffix() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let app = blog_app(dir.path()).await;
    let router = app.router().expect("router failed");

    let (status, post) = call(&router, multipart_post("Login", None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["slug"], json!("login-post"));
}

#[tokio::test]
async fn test_missing_title_is_a_bad_request() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let app = blog_app(dir.path()).await;
    let router = app.router().expect("router failed");

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/posts")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = call(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().is_some_and(|text| text.contains("title is required")));
}
