//! # Widget Component Registries
//!
//! Name-keyed stores for the four component kinds the kernel wires
//! together: models, collections, controllers and plugins. Every kind uses
//! the same [`ComponentRegistry`]; insertion fails on a name collision and
//! lookup fails when the name is absent.
//!
//! - **[`component`]**: the generic registry and [`ComponentKind`].
//! - **[`controller`]**: the [`Controller`] trait and its [`ControllerFactory`],
//!   which supports method probing without constructing an instance.
//! - **[`plugin`]**: the [`Plugin`] trait and [`PluginFactory`].
pub mod component;
pub mod controller;
pub mod error;
pub mod plugin;

pub use component::{ComponentKind, ComponentRegistry};
pub use controller::{Controller, ControllerFactory, ControllerInfo};
pub use error::RegistryError;
pub use plugin::{downcast_plugin, Plugin, PluginFactory};
