//! # Widget Routing
//!
//! Request handling for the kernel: handler chains, route argument
//! normalization, the kernel middleware spliced into routes, and the
//! axum-backed [`HttpEngine`].
//!
//! ## Key Components:
//!
//! - **[`handler`]**: [`Handler`] and the [`Next`] continuation that runs a chain.
//! - **[`args`]**: [`RouteArgs`] shape detection and [`normalize`], which places
//!   kernel middleware after caller middleware and before the terminal handler.
//! - **[`upload`]**: the multipart-gated upload middleware and [`DiskUploader`].
//! - **[`cache`]**: the [`ResponseCache`] boundary and [`MemoryResponseCache`].
//! - **[`forms`]** and **[`csrf`]**: built-in body parsing and CSRF protection.
//! - **[`engine`]**: the route table, router construction, error stage and listener.
pub mod args;
pub mod cache;
pub mod csrf;
pub mod engine;
pub mod error;
pub mod forms;
pub mod handler;
pub mod upload;

pub use args::{normalize, RouteArg, RouteArgs, RouteDefinition, Verb};
pub use cache::{MemoryResponseCache, ResponseCache};
pub use csrf::CsrfToken;
pub use engine::{listen, render_error, HttpEngine, ServerHandle};
pub use error::{HttpError, RouteError, UploadError};
pub use forms::FormData;
pub use handler::{Handler, HandlerResult, Next, Request, Response};
pub use upload::{DiskUploader, UploadHandler, UploadedFile, UploadedFiles};

// Test module declaration
#[cfg(test)]
mod tests;
