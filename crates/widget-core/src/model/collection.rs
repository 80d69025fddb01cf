use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::model::definition::Model;
use crate::model::error::ModelError;
use crate::model::instance::ModelInstance;
use crate::model::store::Attributes;

/// Page size used when a caller passes zero
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Declaration of a collection over a registered model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDefinition {
    model: String,
    page_size: usize,
}

impl CollectionDefinition {
    /// Collection over the model registered as `model`
    pub fn of(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

/// Pagination metadata returned with every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub row_count: usize,
    pub page_count: usize,
}

#[derive(Debug)]
pub struct Page {
    pub models: Vec<ModelInstance>,
    pub pagination: Pagination,
}

/// A registered collection.
pub struct Collection {
    name: String,
    model: Arc<Model>,
    page_size: usize,
}

impl Collection {
    pub fn new(name: impl Into<String>, definition: &CollectionDefinition, model: Arc<Model>) -> Self {
        Self {
            name: name.into(),
            model,
            page_size: definition.page_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Every row of the model's table
    pub async fn fetch(&self) -> Result<Vec<ModelInstance>, ModelError> {
        self.model.fetch_all(Attributes::new()).await
    }

    pub async fn fetch_where(&self, filter: Attributes) -> Result<Vec<ModelInstance>, ModelError> {
        self.model.fetch_all(filter).await
    }

    /// One page of rows, 1-based. A zero `page_size` uses the collection default.
    pub async fn fetch_page(&self, page: usize, page_size: usize) -> Result<Page, ModelError> {
        let page = page.max(1);
        let page_size = match page_size {
            0 if self.page_size > 0 => self.page_size,
            0 => DEFAULT_PAGE_SIZE,
            size => size,
        };

        let store = self.model.orm().store();
        let filter = Attributes::new();
        let row_count = store.count(self.model.table_name(), &filter).await?;
        let offset = (page - 1).saturating_mul(page_size);
        let rows = store
            .fetch_range(self.model.table_name(), &filter, offset, page_size)
            .await?;

        let models = rows.into_iter().map(|row| self.model.forge_stored(row)).collect();
        Ok(Page {
            models,
            pagination: Pagination {
                page,
                page_size,
                row_count,
                page_count: row_count.div_ceil(page_size),
            },
        })
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("page_size", &self.page_size)
            .finish()
    }
}
