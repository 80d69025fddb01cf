use std::fmt;

use async_trait::async_trait;

use crate::model::error::ModelError;
use crate::model::instance::ModelInstance;

/// The five moments of a save or destroy at which hooks may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Creating,
    Saving,
    Destroying,
    Saved,
    Updated,
}

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 5] = [
        LifecyclePhase::Creating,
        LifecyclePhase::Saving,
        LifecyclePhase::Destroying,
        LifecyclePhase::Saved,
        LifecyclePhase::Updated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Creating => "creating",
            LifecyclePhase::Saving => "saving",
            LifecyclePhase::Destroying => "destroying",
            LifecyclePhase::Saved => "saved",
            LifecyclePhase::Updated => "updated",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of write a save performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMethod {
    Insert,
    Update,
}

/// Options handed to every hook of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub method: SaveMethod,
}

/// Optional per-model lifecycle hooks.
///
/// A model lists the phases it handles in [`overrides`](ModelHooks::overrides)
/// and implements the matching methods. Phases not listed are skipped without
/// calling anything. Returning `Err` from a hook vetoes the operation and the
/// error reaches the caller of `save` or `destroy`.
#[async_trait]
pub trait ModelHooks: Send + Sync {
    /// Phases this model implements
    fn overrides(&self) -> &[LifecyclePhase] {
        &[]
    }

    async fn creating(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        Ok(())
    }

    async fn saving(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        Ok(())
    }

    async fn destroying(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        Ok(())
    }

    async fn saved(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        Ok(())
    }

    async fn updated(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Hooks for models without business rules
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ModelHooks for NoHooks {}

/// Routes lifecycle notifications from the save path to a model's hooks.
pub struct LifecycleBridge;

impl LifecycleBridge {
    /// Whether `hooks` implements `phase`
    pub fn handles(hooks: &dyn ModelHooks, phase: LifecyclePhase) -> bool {
        hooks.overrides().contains(&phase)
    }

    /// Fire `phase` on `model`. A no-op when the hooks do not override it.
    pub async fn dispatch(
        hooks: &dyn ModelHooks,
        phase: LifecyclePhase,
        model: &mut ModelInstance,
        options: &SaveOptions,
    ) -> Result<(), ModelError> {
        if !Self::handles(hooks, phase) {
            return Ok(());
        }

        log::trace!("Running {} hook on {}", phase, model.table_name());
        let result = match phase {
            LifecyclePhase::Creating => hooks.creating(model, options).await,
            LifecyclePhase::Saving => hooks.saving(model, options).await,
            LifecyclePhase::Destroying => hooks.destroying(model, options).await,
            LifecyclePhase::Saved => hooks.saved(model, options).await,
            LifecyclePhase::Updated => hooks.updated(model, options).await,
        };
        if let Err(e) = &result {
            log::debug!("{} hook on {} failed: {}", phase, model.table_name(), e);
        }
        result
    }
}
