use std::fmt;
use std::sync::Arc;

use crate::config::DbConfig;
use crate::kernel::constants::MEMORY_DB_CLIENT;
use crate::model::error::ModelError;
use crate::model::store::{MemoryStore, Persistence};

/// Select the persistence engine for `db`, unless an engine was supplied.
pub fn bootstrap_persistence(
    db: &DbConfig,
    supplied: Option<Arc<dyn Persistence>>,
) -> Result<Arc<dyn Persistence>, ModelError> {
    if let Some(store) = supplied {
        log::info!("Using supplied persistence engine '{}'", store.client());
        return Ok(store);
    }
    if db.client == MEMORY_DB_CLIENT {
        log::info!("Persistence engine initialized ({})", MEMORY_DB_CLIENT);
        return Ok(Arc::new(MemoryStore::new()));
    }
    Err(ModelError::Persistence(format!(
        "No engine available for db client '{}'",
        db.client
    )))
}

/// Model base shared by every registered model: the engine plus defaults.
pub struct Orm {
    store: Arc<dyn Persistence>,
    timestamps: bool,
}

impl Orm {
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store, timestamps: true }
    }

    /// Default for models that do not set their own timestamps flag
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn store(&self) -> &Arc<dyn Persistence> {
        &self.store
    }

    pub fn timestamps(&self) -> bool {
        self.timestamps
    }
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("client", &self.store.client())
            .field("timestamps", &self.timestamps)
            .finish()
    }
}
