//! # Widget Model Layer
//!
//! The persistence-facing half of the kernel. Application code declares
//! models with [`ModelDefinition`] and collections with
//! [`CollectionDefinition`]; the kernel binds them to the shared [`Orm`]
//! model base and stores them in its registries.
//!
//! ## Key Components:
//!
//! - **[`store`]**: the [`Persistence`] boundary and the in-process [`MemoryStore`].
//! - **[`orm`]**: engine selection and the [`Orm`] model base.
//! - **[`definition`]** / **[`instance`]**: registered [`Model`]s and their
//!   [`ModelInstance`]s with the save/destroy sequence.
//! - **[`collection`]**: [`Collection`] fetching and pagination.
//! - **[`lifecycle`]**: [`ModelHooks`] and the [`LifecycleBridge`] that fires them.
//! - **[`slug`]**: slug normalization and the uniqueness check.
pub mod collection;
pub mod definition;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod orm;
pub mod slug;
pub mod store;

pub use collection::{Collection, CollectionDefinition, Page, Pagination};
pub use definition::{Model, ModelDefinition};
pub use error::ModelError;
pub use instance::ModelInstance;
pub use lifecycle::{LifecycleBridge, LifecyclePhase, ModelHooks, NoHooks, SaveMethod, SaveOptions};
pub use orm::{bootstrap_persistence, Orm};
pub use slug::{generate_slug, slugify, ColumnLookup, SlugLookup};
pub use store::{Attributes, MemoryStore, Persistence};

// Test module declaration
#[cfg(test)]
mod tests;
