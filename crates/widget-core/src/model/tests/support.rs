use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::model::{
    Attributes, LifecyclePhase, MemoryStore, Model, ModelDefinition, ModelError, ModelHooks, ModelInstance, Orm,
    SaveOptions,
};

pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

pub fn orm() -> Arc<Orm> {
    Arc::new(Orm::new(Arc::new(MemoryStore::new().with_unique("posts", "slug"))))
}

pub fn model(definition: ModelDefinition) -> Arc<Model> {
    Arc::new(Model::new("Post", definition, orm()))
}

pub async fn seed(model: &Arc<Model>, count: usize) {
    for n in 1..=count {
        model
            .forge(attrs(json!({ "title": format!("Post {}", n) })))
            .save()
            .await
            .unwrap();
    }
}

/// Hooks that record every phase and optionally veto one
#[derive(Clone, Default)]
pub struct RecordingHooks {
    pub log: Arc<Mutex<Vec<String>>>,
    pub veto: Option<LifecyclePhase>,
}

impl RecordingHooks {
    pub fn vetoing(phase: LifecyclePhase) -> Self {
        Self {
            veto: Some(phase),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, phase: LifecyclePhase) -> Result<(), ModelError> {
        self.log.lock().unwrap().push(phase.to_string());
        if self.veto == Some(phase) {
            return Err(ModelError::hook(phase, "not allowed"));
        }
        Ok(())
    }
}

#[async_trait]
impl ModelHooks for RecordingHooks {
    fn overrides(&self) -> &[LifecyclePhase] {
        &LifecyclePhase::ALL
    }

    async fn creating(&self, model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        self.record(LifecyclePhase::Creating)?;
        if model.get("slug").is_none() {
            let base = model.get_str("title").unwrap_or_default().to_string();
            let slug = model.generate_slug(&base).await?;
            model.set("slug", slug);
        }
        Ok(())
    }

    async fn saving(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        self.record(LifecyclePhase::Saving)
    }

    async fn destroying(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        self.record(LifecyclePhase::Destroying)
    }

    async fn saved(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        self.record(LifecyclePhase::Saved)
    }

    async fn updated(&self, _model: &mut ModelInstance, _options: &SaveOptions) -> Result<(), ModelError> {
        self.record(LifecyclePhase::Updated)
    }
}
