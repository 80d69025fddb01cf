use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::model::definition::Model;
use crate::model::error::ModelError;
use crate::model::lifecycle::{LifecycleBridge, LifecyclePhase, SaveMethod, SaveOptions};
use crate::model::slug::{generate_slug, ColumnLookup};
use crate::model::store::{Attributes, ID_COLUMN};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const SLUG_COLUMN: &str = "slug";

/// One entity of a registered model.
///
/// Tracks the attributes as last synced with the store so
/// [`has_changed`](ModelInstance::has_changed) can tell what a hook or
/// caller modified since.
pub struct ModelInstance {
    model: Arc<Model>,
    attributes: Attributes,
    synced: Attributes,
}

impl ModelInstance {
    pub(crate) fn new(model: Arc<Model>, attributes: Attributes) -> Self {
        Self {
            model,
            attributes,
            synced: Attributes::new(),
        }
    }

    pub(crate) fn from_row(model: Arc<Model>, row: Attributes) -> Self {
        Self {
            model,
            synced: row.clone(),
            attributes: row,
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn table_name(&self) -> &str {
        self.model.table_name()
    }

    pub fn id(&self) -> Option<&Value> {
        self.attributes.get(ID_COLUMN).filter(|id| !id.is_null())
    }

    /// True until the instance has been written to the store
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn set_all(&mut self, attributes: Attributes) -> &mut Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Whether `key` differs from its last synced value.
    pub fn has_changed(&self, key: &str) -> bool {
        self.attributes.get(key) != self.synced.get(key)
    }

    /// Every attribute as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// JSON object restricted to `props`; absent ones map to `null`.
    pub fn pick(&self, props: &[&str]) -> Value {
        let picked = props
            .iter()
            .map(|prop| (prop.to_string(), self.attributes.get(*prop).cloned().unwrap_or(Value::Null)))
            .collect();
        Value::Object(picked)
    }

    /// Persist the instance.
    ///
    /// Runs `saving`, then `creating` for new rows, writes, then `updated`
    /// for existing rows and finally `saved`. A hook error stops the sequence
    /// and is returned; nothing is written if it happens before the write.
    pub async fn save(&mut self) -> Result<(), ModelError> {
        let hooks = self.model.hooks();
        let method = if self.is_new() {
            SaveMethod::Insert
        } else {
            SaveMethod::Update
        };
        let options = SaveOptions { method };

        LifecycleBridge::dispatch(hooks.as_ref(), LifecyclePhase::Saving, self, &options).await?;
        if method == SaveMethod::Insert {
            LifecycleBridge::dispatch(hooks.as_ref(), LifecyclePhase::Creating, self, &options).await?;
        }

        if self.model.timestamps() {
            let now = Value::from(Utc::now().to_rfc3339());
            if method == SaveMethod::Insert && !self.attributes.contains_key(CREATED_AT) {
                self.attributes.insert(CREATED_AT.to_string(), now.clone());
            }
            self.attributes.insert(UPDATED_AT.to_string(), now);
        }

        let store = self.model.orm().store().clone();
        let table = self.model.table_name().to_string();
        let row = match method {
            SaveMethod::Insert => store.insert(&table, self.attributes.clone()).await?,
            SaveMethod::Update => {
                let id = self.id().cloned().unwrap_or(Value::Null);
                store.update(&table, &id, self.attributes.clone()).await?
            }
        };
        self.attributes = row;

        if method == SaveMethod::Update {
            LifecycleBridge::dispatch(hooks.as_ref(), LifecyclePhase::Updated, self, &options).await?;
        }
        LifecycleBridge::dispatch(hooks.as_ref(), LifecyclePhase::Saved, self, &options).await?;
        self.synced = self.attributes.clone();
        Ok(())
    }

    /// Delete the stored row after the `destroying` hook allows it.
    pub async fn destroy(&mut self) -> Result<(), ModelError> {
        let id = self.id().cloned().ok_or_else(|| ModelError::NotFound {
            table: self.table_name().to_string(),
            key: "unsaved instance".to_string(),
        })?;
        let hooks = self.model.hooks();
        let options = SaveOptions {
            method: SaveMethod::Update,
        };
        LifecycleBridge::dispatch(hooks.as_ref(), LifecyclePhase::Destroying, self, &options).await?;

        let removed = self.model.orm().store().delete(self.table_name(), &id).await?;
        if !removed {
            return Err(ModelError::NotFound {
                table: self.table_name().to_string(),
                key: format!("{}={}", ID_COLUMN, id),
            });
        }
        self.attributes.remove(ID_COLUMN);
        self.synced = Attributes::new();
        Ok(())
    }

    /// A slug for `base`, unique within this model's table.
    pub async fn generate_slug(&self, base: &str) -> Result<String, ModelError> {
        let lookup = ColumnLookup::new(self.model.orm().store().clone(), self.table_name(), SLUG_COLUMN);
        generate_slug(base, self.model.owner_name(), &lookup).await
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance")
            .field("model", &self.model.name())
            .field("attributes", &self.attributes)
            .finish()
    }
}
