use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::model::error::ModelError;
use crate::model::instance::{ModelInstance, SLUG_COLUMN};
use crate::model::lifecycle::{ModelHooks, NoHooks};
use crate::model::orm::Orm;
use crate::model::slug;
use crate::model::store::Attributes;

/// Declaration of a model type, supplied by application code.
///
/// The `slug` column is unique in every model's table; rows without a slug
/// never clash.
#[derive(Clone)]
pub struct ModelDefinition {
    table: String,
    timestamps: Option<bool>,
    unique: Vec<String>,
    hooks: Arc<dyn ModelHooks>,
}

impl ModelDefinition {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            timestamps: None,
            unique: vec![SLUG_COLUMN.to_string()],
            hooks: Arc::new(NoHooks),
        }
    }

    /// Also enforce uniqueness of `column` once the model is registered
    pub fn with_unique(mut self, column: &str) -> Self {
        if !self.unique.iter().any(|known| known == column) {
            self.unique.push(column.to_string());
        }
        self
    }

    pub fn unique_columns(&self) -> &[String] {
        &self.unique
    }

    pub fn with_hooks<H: ModelHooks + 'static>(mut self, hooks: H) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Override the model base's `created_at`/`updated_at` default
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("table", &self.table)
            .field("timestamps", &self.timestamps)
            .field("unique", &self.unique)
            .field("hooks", &self.hooks.overrides())
            .finish()
    }
}

/// A registered model: its definition bound to the model base.
pub struct Model {
    name: String,
    definition: ModelDefinition,
    orm: Arc<Orm>,
}

impl Model {
    pub fn new(name: impl Into<String>, definition: ModelDefinition, orm: Arc<Orm>) -> Self {
        Self {
            name: name.into(),
            definition,
            orm,
        }
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.definition.table
    }

    /// Singular type name used by slug generation (`posts` -> `post`)
    pub fn owner_name(&self) -> &str {
        slug::owner_name(&self.definition.table)
    }

    pub fn timestamps(&self) -> bool {
        self.definition.timestamps.unwrap_or_else(|| self.orm.timestamps())
    }

    pub fn hooks(&self) -> Arc<dyn ModelHooks> {
        self.definition.hooks.clone()
    }

    pub fn orm(&self) -> &Arc<Orm> {
        &self.orm
    }

    /// New unsaved instance holding `attributes`.
    pub fn forge(self: &Arc<Self>, attributes: Attributes) -> ModelInstance {
        ModelInstance::new(self.clone(), attributes)
    }

    pub(crate) fn forge_stored(self: &Arc<Self>, row: Attributes) -> ModelInstance {
        ModelInstance::from_row(self.clone(), row)
    }

    /// First stored row matching `filter`.
    pub async fn fetch_by(self: &Arc<Self>, filter: Attributes) -> Result<Option<ModelInstance>, ModelError> {
        let row = self.orm.store().find_one(self.table_name(), &filter).await?;
        Ok(row.map(|row| self.forge_stored(row)))
    }

    /// Like [`fetch_by`](Model::fetch_by) but a missing row is an error.
    pub async fn require_by(self: &Arc<Self>, filter: Attributes) -> Result<ModelInstance, ModelError> {
        let key = Value::Object(filter.clone()).to_string();
        self.fetch_by(filter).await?.ok_or_else(|| ModelError::NotFound {
            table: self.table_name().to_string(),
            key,
        })
    }

    pub async fn fetch_all(self: &Arc<Self>, filter: Attributes) -> Result<Vec<ModelInstance>, ModelError> {
        let rows = self.orm.store().fetch_all(self.table_name(), &filter).await?;
        Ok(rows
            .into_iter()
            .map(|row| self.forge_stored(row))
            .collect())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("table", &self.definition.table)
            .finish()
    }
}
