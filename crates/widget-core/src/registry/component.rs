use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::registry::error::RegistryError;

/// The four kinds of named components the kernel keeps registries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Model,
    Collection,
    Controller,
    Plugin,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComponentKind::Model => "Model",
            ComponentKind::Collection => "Collection",
            ComponentKind::Controller => "Controller",
            ComponentKind::Plugin => "Plugin",
        };
        f.write_str(label)
    }
}

/// Name-keyed store of shared factories for one [`ComponentKind`].
///
/// Names are case-sensitive and unique within the registry. Insertion order
/// is kept so listings are stable.
pub struct ComponentRegistry<T: ?Sized> {
    kind: ComponentKind,
    entries: HashMap<String, Arc<T>>,
    order: Vec<String>,
}

impl<T: ?Sized> ComponentRegistry<T> {
    /// Create an empty registry for `kind`
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Store `factory` under `name` and hand it back.
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<T>) -> Result<Arc<T>, RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName { kind: self.kind, name });
        }

        log::debug!("Registered {}<{}>", self.kind, name);
        self.order.push(name.clone());
        self.entries.insert(name, factory.clone());
        Ok(factory)
    }

    pub fn get(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// Borrowing lookup, for callers that only need a reference.
    pub fn lookup(&self, name: &str) -> Result<&Arc<T>, RegistryError> {
        self.entries.get(name).ok_or_else(|| RegistryError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(name, factory)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|entry| (name.as_str(), entry)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Clone for ComponentRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            entries: self.entries.clone(),
            order: self.order.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ComponentRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("kind", &self.kind)
            .field("names", &self.order)
            .finish()
    }
}
