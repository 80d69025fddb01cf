use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::header::CONTENT_TYPE;
use chrono::Utc;

use crate::routing::error::UploadError;
use crate::routing::forms::FormData;
use crate::routing::handler::{Handler, Next, Request};

/// Metadata for one stored file part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub original_name: Option<String>,
    pub file_name: String,
    pub path: PathBuf,
    pub content_type: Option<String>,
    pub size: usize,
}

/// Files stored for the current request, attached as an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFiles(pub Vec<UploadedFile>);

/// Boundary to the storage collaborator that consumes multipart bodies.
///
/// Implementations read the body, store what they need, and return the
/// request (typically with an emptied body and extra extensions) so the
/// chain can continue.
#[async_trait]
pub trait UploadHandler: Send + Sync {
    async fn handle(&self, request: Request) -> Result<Request, UploadError>;
}

/// True when the request declares a multipart body.
pub fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/"))
        .unwrap_or(false)
}

/// Kernel middleware for write verbs.
///
/// Multipart requests go through `uploader` first and only continue on
/// success; an upload failure is handed to the error stage. Every other
/// content type passes straight through.
pub fn upload_middleware(uploader: Arc<dyn UploadHandler>) -> Handler {
    Handler::new(move |request: Request, next: Next| {
        let uploader = uploader.clone();
        async move {
            if !is_multipart(&request) {
                return next.run(request).await;
            }
            let request = uploader.handle(request).await?;
            next.run(request).await
        }
    })
    .named("upload")
}

/// Stores file parts on disk as `image_{millis}.{ext}`.
#[derive(Debug, Clone)]
pub struct DiskUploader {
    dir: PathBuf,
}

impl DiskUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// File extension for a MIME type, preferring the subtype name (`image/jpeg` -> `jpeg`).
pub fn extension_for(content_type: Option<&str>) -> String {
    let Some(mime) = content_type else {
        return "bin".to_string();
    };
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    let subtype = essence.rsplit('/').next().unwrap_or_default();
    match mime_guess::get_mime_extensions_str(essence) {
        Some(exts) => exts
            .iter()
            .find(|ext| **ext == subtype)
            .or_else(|| exts.first())
            .map(|ext| ext.to_string())
            .unwrap_or_else(|| "bin".to_string()),
        None => "bin".to_string(),
    }
}

#[async_trait]
impl UploadHandler for DiskUploader {
    async fn handle(&self, request: Request) -> Result<Request, UploadError> {
        let (parts, body) = request.into_parts();
        let mut multipart_request = Request::new(body);
        *multipart_request.headers_mut() = parts.headers.clone();
        *multipart_request.extensions_mut() = parts.extensions.clone();
        let mut multipart = Multipart::from_request(multipart_request, &()).await?;

        let stamp = Utc::now().timestamp_millis();
        let mut form = FormData::new();
        let mut files = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_none() {
                form.insert(name, field.text().await?);
                continue;
            }

            let original_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let ext = extension_for(content_type.as_deref());
            let file_name = if files.is_empty() {
                format!("image_{}.{}", stamp, ext)
            } else {
                format!("image_{}_{}.{}", stamp, files.len(), ext)
            };
            let data = field.bytes().await?;

            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|source| UploadError::Storage {
                    path: self.dir.display().to_string(),
                    source,
                })?;
            let path = self.dir.join(&file_name);
            tokio::fs::write(&path, &data)
                .await
                .map_err(|source| UploadError::Storage {
                    path: path.display().to_string(),
                    source,
                })?;

            log::debug!("Stored upload '{}' ({} bytes)", path.display(), data.len());
            files.push(UploadedFile {
                field: name,
                original_name,
                file_name,
                path,
                content_type,
                size: data.len(),
            });
        }

        let mut request = Request::from_parts(parts, Body::empty());
        match request.extensions_mut().get_mut::<FormData>() {
            Some(existing) => existing.extend(form),
            None => {
                request.extensions_mut().insert(form);
            }
        }
        request.extensions_mut().insert(UploadedFiles(files));
        Ok(request)
    }
}
