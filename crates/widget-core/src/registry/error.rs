//! # Widget Registry Errors
//!
//! `DuplicateName` is fatal at load time: two modules claimed the same name
//! within one kind. `NotFound` is raised at call time and propagated to the
//! caller. Its message embeds the kind and the name, e.g. `Model<Foo> not found`.
use thiserror::Error;

use crate::registry::component::ComponentKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{kind}<{name}> is already defined in the registry")]
    DuplicateName { kind: ComponentKind, name: String },

    #[error("{kind}<{name}> not found")]
    NotFound { kind: ComponentKind, name: String },

    #[error("{kind}<{name}> has no method '{method}'")]
    MethodNotFound {
        kind: ComponentKind,
        name: String,
        method: String,
    },
}
