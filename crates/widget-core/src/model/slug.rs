//! URL slugs for persisted entities.
//!
//! [`slugify`] is the pure transform; [`generate_slug`] adds the uniqueness
//! check. The lookup and the later insert are separate operations, so two
//! concurrent saves with colliding bases can both pick the same slug. The
//! store's unique constraint then rejects one of them with `PersistenceRace`.
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::error::ModelError;
use crate::model::store::{Attributes, Persistence};

/// Characters removed outright: URL-reserved plus shell-hazardous punctuation
const STRIPPED: &[char] = &[
    ':', '/', '?', '#', '[', ']', '@', '!', '$', '&', '\'', '(', ')', '*', '+', ',', ';', '=', '\\', '%', '<', '>',
    '|', '^', '~', '£', '"',
];

/// Route-like words a slug may not be on its own
pub const RESERVED_SLUGS: &[&str] = &[
    "events", "edit", "new", "devs", "meetups", "account", "admin", "blog", "companies", "jobs", "logout", "login",
    "signin", "signup", "signout", "register", "archive", "archives", "category", "categories", "tag", "tags", "page",
    "pages", "post", "posts", "user", "users", "rss", "feed",
];

/// Normalize `base` into a slug without checking uniqueness.
///
/// Reserved words get `-{owner}` appended and an empty result falls back to
/// `owner`.
pub fn slugify(base: &str, owner: &str) -> String {
    let ascii = deunicode::deunicode(base.trim());

    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if STRIPPED.contains(&c) {
            continue;
        }
        let c = if c.is_whitespace() || c == '.' { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.extend(c.to_lowercase());
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        slug = format!("{}-{}", slug, owner);
    }
    if slug.is_empty() {
        slug = owner.to_string();
    }
    slug
}

/// Existence check used while probing for a free slug.
#[async_trait]
pub trait SlugLookup: Send + Sync {
    async fn exists(&self, candidate: &str) -> Result<bool, ModelError>;
}

#[async_trait]
impl SlugLookup for HashSet<String> {
    async fn exists(&self, candidate: &str) -> Result<bool, ModelError> {
        Ok(self.contains(candidate))
    }
}

/// Looks up one column of a table through the persistence engine.
pub struct ColumnLookup {
    store: Arc<dyn Persistence>,
    table: String,
    column: String,
}

impl ColumnLookup {
    pub fn new(store: Arc<dyn Persistence>, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            column: column.into(),
        }
    }
}

#[async_trait]
impl SlugLookup for ColumnLookup {
    async fn exists(&self, candidate: &str) -> Result<bool, ModelError> {
        let mut filter = Attributes::new();
        filter.insert(self.column.clone(), Value::from(candidate));
        self.store.exists(&self.table, &filter).await
    }
}

/// Produce a slug for `base` that `lookup` reports as unused.
///
/// The first collision appends `-2`; every later one replaces the previous
/// numeric suffix with the next integer (`-9` then `-10` then `-11`).
pub async fn generate_slug(base: &str, owner: &str, lookup: &dyn SlugLookup) -> Result<String, ModelError> {
    let mut candidate = slugify(base, owner);
    if candidate.is_empty() {
        return Err(ModelError::Slug(format!(
            "neither '{}' nor owner '{}' leaves any slug characters",
            base, owner
        )));
    }
    let mut tries: usize = 1;

    while lookup.exists(&candidate).await? {
        tries += 1;
        if tries == 2 {
            candidate.push('-');
        } else {
            let previous = (tries - 1).to_string();
            let keep = candidate.len().saturating_sub(previous.len());
            candidate.truncate(keep);
        }
        candidate.push_str(&tries.to_string());
    }

    log::debug!("Generated slug '{}' after {} lookup(s)", candidate, tries);
    Ok(candidate)
}

/// Owner type name for a table: the table name with one trailing `s` removed.
pub fn owner_name(table: &str) -> &str {
    table.strip_suffix('s').unwrap_or(table)
}
