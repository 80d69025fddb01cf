//! # Widget Core Kernel
//!
//! The `kernel` module is the composition root of `widget-core`. It accepts
//! the configuration once, wires models, collections, controllers, plugins,
//! routes and widgets together in a fixed order, and hands out the running
//! server.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application Bootstrapping**: [`Application`](bootstrap::Application) moves
//!   through [`KernelState`](bootstrap::KernelState) `Unconfigured -> Configured -> Started`
//!   and runs every startup step from [`boot`](bootstrap::Application::boot).
//! - **Module Registration**: a [`Manifest`](manifest::Manifest) lists the modules
//!   each step loads, replacing directory scanning.
//! - **Request Services**: [`Services`](services::Services) carries the shared handles
//!   handlers need; [`WidgetCatalog`](widgets::WidgetCatalog) resolves widget templates.
//! - **Core Constants**: defaults and well-known names live in `constants`.
//! - **Error Handling**: the kernel [`Error`](error::Error) and `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;
pub mod manifest;
pub mod services;
pub mod widgets;

pub use bootstrap::{Application, BootSummary, KernelState};
pub use error::{Error, KernelLifecyclePhase, Result};
pub use manifest::{Manifest, Module, ModuleLoader};
pub use services::{Services, TemplateHelper};
pub use widgets::WidgetCatalog;

// Test module declaration
#[cfg(test)]
mod tests;
