use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock as SyncRwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::model::error::ModelError;

/// A row: column name to value
pub type Attributes = Map<String, Value>;

/// Primary key column assigned by the store
pub const ID_COLUMN: &str = "id";

/// Boundary to the persistence engine.
///
/// Filters are equality matches on every listed column. Rows carry their
/// primary key under [`ID_COLUMN`].
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Engine name for logs
    fn client(&self) -> &str;

    async fn find_one(&self, table: &str, filter: &Attributes) -> Result<Option<Attributes>, ModelError>;

    async fn fetch_all(&self, table: &str, filter: &Attributes) -> Result<Vec<Attributes>, ModelError>;

    /// Insert a row and return it with its assigned id
    async fn insert(&self, table: &str, attributes: Attributes) -> Result<Attributes, ModelError>;

    /// Merge `attributes` into the row with `id` and return the stored row
    async fn update(&self, table: &str, id: &Value, attributes: Attributes) -> Result<Attributes, ModelError>;

    /// Remove the row with `id`; `false` when it did not exist
    async fn delete(&self, table: &str, id: &Value) -> Result<bool, ModelError>;

    /// Reject later writes that repeat a non-null `column` value within `table`.
    ///
    /// A clash is reported as [`ModelError::PersistenceRace`].
    fn declare_unique(&self, table: &str, column: &str) -> Result<(), ModelError>;

    async fn exists(&self, table: &str, filter: &Attributes) -> Result<bool, ModelError> {
        Ok(self.find_one(table, filter).await?.is_some())
    }

    async fn count(&self, table: &str, filter: &Attributes) -> Result<usize, ModelError> {
        Ok(self.fetch_all(table, filter).await?.len())
    }

    async fn fetch_range(
        &self,
        table: &str,
        filter: &Attributes,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Attributes>, ModelError> {
        Ok(self
            .fetch_all(table, filter)
            .await?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Attributes>,
    next_id: i64,
}

fn matches(row: &Attributes, filter: &Attributes) -> bool {
    filter.iter().all(|(column, value)| row.get(column) == Some(value))
}

fn row_id(id: &Value) -> Result<i64, ModelError> {
    id.as_i64()
        .ok_or_else(|| ModelError::Persistence(format!("Invalid row id {}", id)))
}

/// In-process store used for the `memory` client and in tests.
///
/// Unique columns declared with [`with_unique`](MemoryStore::with_unique) or
/// [`Persistence::declare_unique`] are checked on every write; a clash fails
/// with `PersistenceRace`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    unique: SyncRwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `column` of `table` unique
    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        let unique = self.unique.get_mut().unwrap_or_else(PoisonError::into_inner);
        add_unique(unique, table, column);
        self
    }

    fn check_unique(&self, table_name: &str, table: &Table, row: &Attributes, skip: Option<i64>) -> Result<(), ModelError> {
        let unique = self.unique.read().unwrap_or_else(PoisonError::into_inner);
        let Some(columns) = unique.get(table_name) else {
            return Ok(());
        };
        for column in columns {
            let Some(value) = row.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = table
                .rows
                .iter()
                .filter(|(id, _)| Some(**id) != skip)
                .any(|(_, other)| other.get(column) == Some(value));
            if clash {
                return Err(ModelError::PersistenceRace {
                    table: table_name.to_string(),
                    column: column.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn add_unique(unique: &mut HashMap<String, Vec<String>>, table: &str, column: &str) {
    let columns = unique.entry(table.to_string()).or_default();
    if !columns.iter().any(|known| known == column) {
        columns.push(column.to_string());
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    fn client(&self) -> &str {
        "memory"
    }

    fn declare_unique(&self, table: &str, column: &str) -> Result<(), ModelError> {
        let mut unique = self.unique.write().unwrap_or_else(PoisonError::into_inner);
        add_unique(&mut unique, table, column);
        log::debug!("Unique constraint on {}.{}", table, column);
        Ok(())
    }

    async fn find_one(&self, table: &str, filter: &Attributes) -> Result<Option<Attributes>, ModelError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|t| t.rows.values().find(|row| matches(row, filter)))
            .cloned())
    }

    async fn fetch_all(&self, table: &str, filter: &Attributes) -> Result<Vec<Attributes>, ModelError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|t| t.rows.values().filter(|row| matches(row, filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, mut attributes: Attributes) -> Result<Attributes, ModelError> {
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.to_string()).or_default();
        self.check_unique(table, entry, &attributes, None)?;

        entry.next_id += 1;
        let id = entry.next_id;
        attributes.insert(ID_COLUMN.to_string(), Value::from(id));
        entry.rows.insert(id, attributes.clone());
        Ok(attributes)
    }

    async fn update(&self, table: &str, id: &Value, attributes: Attributes) -> Result<Attributes, ModelError> {
        let key = row_id(id)?;
        let mut tables = self.tables.write().await;
        let not_found = || ModelError::NotFound {
            table: table.to_string(),
            key: format!("{}={}", ID_COLUMN, id),
        };
        let entry = tables.get_mut(table).ok_or_else(not_found)?;

        let mut merged = entry.rows.get(&key).cloned().ok_or_else(not_found)?;
        merged.extend(attributes);
        merged.insert(ID_COLUMN.to_string(), Value::from(key));
        self.check_unique(table, entry, &merged, Some(key))?;

        entry.rows.insert(key, merged.clone());
        Ok(merged)
    }

    async fn delete(&self, table: &str, id: &Value) -> Result<bool, ModelError> {
        let key = row_id(id)?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(table)
            .map(|t| t.rows.remove(&key).is_some())
            .unwrap_or(false))
    }

    async fn count(&self, table: &str, filter: &Attributes) -> Result<usize, ModelError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|t| t.rows.values().filter(|row| matches(row, filter)).count())
            .unwrap_or(0))
    }
}
