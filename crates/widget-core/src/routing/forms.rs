use std::collections::BTreeMap;

use axum::body::{to_bytes, Body};
use axum::extract::{Form, FromRequest};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use serde_json::Value;

use crate::routing::error::HttpError;
use crate::routing::handler::{Handler, Next, Request};

/// Parsed form fields attached to the request as an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge `other` into self; existing names are overwritten.
    pub fn extend(&mut self, other: FormData) {
        self.fields.extend(other.fields);
    }

    /// HTML-escape every value in place.
    pub fn escape_values(&mut self) {
        for value in self.fields.values_mut() {
            *value = escape_html(value);
        }
    }
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

fn content_type(request: &Request) -> Option<String> {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase())
}

fn json_fields(bytes: &[u8]) -> Result<FormData, HttpError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| HttpError::bad_request(format!("Invalid JSON body: {}", e)))?;
    let mut form = FormData::new();
    if let Value::Object(map) = value {
        for (name, value) in map {
            let text = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            form.insert(name, text);
        }
    }
    Ok(form)
}

async fn urlencoded_fields(content_type: &str, bytes: bytes::Bytes) -> Result<FormData, HttpError> {
    let parse_request = axum::http::Request::builder()
        .method(Method::POST)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .map_err(|e| HttpError::Internal(e.to_string()))?;
    let Form(pairs) = Form::<Vec<(String, String)>>::from_request(parse_request, &())
        .await
        .map_err(|e| HttpError::bad_request(e.body_text()))?;

    let mut form = FormData::new();
    for (name, value) in pairs {
        form.insert(name, value);
    }
    Ok(form)
}

/// Body parser for urlencoded and JSON requests.
///
/// The parsed fields are attached as a [`FormData`] extension and the body
/// bytes are put back so later handlers can still read them. Multipart
/// bodies are left to the upload middleware.
pub fn forms_middleware(input_validation: bool, body_limit: usize) -> Handler {
    Handler::new(move |request: Request, next: Next| async move {
        let Some(kind) = content_type(&request) else {
            return next.run(request).await;
        };
        let is_json = kind.starts_with("application/json");
        let is_urlencoded = kind.starts_with("application/x-www-form-urlencoded");
        if !is_json && !is_urlencoded {
            return next.run(request).await;
        }

        let (mut parts, body) = request.into_parts();
        let bytes = to_bytes(body, body_limit)
            .await
            .map_err(|e| HttpError::new(axum::http::StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))?;

        let mut form = if is_json {
            json_fields(&bytes)?
        } else {
            urlencoded_fields(&kind, bytes.clone()).await?
        };
        if input_validation {
            form.escape_values();
        }

        parts.extensions.insert(form);
        next.run(Request::from_parts(parts, Body::from(bytes))).await
    })
    .named("forms")
}
