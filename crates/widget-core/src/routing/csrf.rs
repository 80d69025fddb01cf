use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, Method};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::kernel::constants::{CSRF_COOKIE, CSRF_HEADER};
use crate::routing::error::HttpError;
use crate::routing::forms::FormData;
use crate::routing::handler::{Handler, Next, Request};

/// Token for the current request, attached as an extension for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

const TOKEN_LEN: usize = 32;

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn cookie_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn submitted_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<FormData>()
                .and_then(|form| form.get(CSRF_COOKIE))
                .map(str::to_string)
        })
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Double-submit CSRF check.
///
/// Safe methods get a `_csrf` cookie when they lack one. Other methods must
/// echo the cookie through the `x-csrf-token` header or a `_csrf` form field,
/// unless their path is whitelisted.
pub fn csrf_middleware(whitelist: Vec<String>) -> Handler {
    Handler::new(move |mut request: Request, next: Next| {
        let exempt = whitelist.iter().any(|path| path == request.uri().path());
        async move {
            let cookie = cookie_value(&request, CSRF_COOKIE);

            if is_safe(request.method()) || exempt {
                let (token, fresh) = match cookie {
                    Some(token) => (token, false),
                    None => (generate_token(), true),
                };
                request.extensions_mut().insert(CsrfToken(token.clone()));
                let mut response = next.run(request).await?;
                if fresh {
                    let cookie = format!("{}={}; Path=/; SameSite=Strict", CSRF_COOKIE, token);
                    if let Ok(value) = HeaderValue::from_str(&cookie) {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                }
                return Ok(response);
            }

            match (cookie, submitted_token(&request)) {
                (Some(expected), Some(actual)) if !expected.is_empty() && expected == actual => {
                    request.extensions_mut().insert(CsrfToken(expected));
                    next.run(request).await
                }
                _ => {
                    log::warn!("Rejected {} {}: CSRF token mismatch", request.method(), request.uri().path());
                    Err(HttpError::Csrf)
                }
            }
        }
    })
    .named("csrf")
}
