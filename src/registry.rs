//! Model-id to webhook-URL lookup seam.
//!
//! The hot-reload/polling loader that keeps deployments in sync lives outside
//! this crate; the executors only need the lookup. [`StaticModelRepository`]
//! covers tests and fixed deployments.

use std::collections::HashMap;

/// Resolves a model identifier to the webhook URL that serves it.
pub trait ModelRepository: Send + Sync {
    /// Returns the webhook URL for the model, or `None` when unknown.
    fn webhook_url(&self, model_id: &str) -> Option<String>;
}

/// In-memory model table.
#[derive(Debug, Clone, Default)]
pub struct StaticModelRepository {
    models: HashMap<String, String>,
}

impl StaticModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a model's webhook URL.
    pub fn insert(&mut self, model_id: impl Into<String>, url: impl Into<String>) {
        self.models.insert(model_id.into(), url.into());
    }
}

impl FromIterator<(String, String)> for StaticModelRepository {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}

impl ModelRepository for StaticModelRepository {
    fn webhook_url(&self, model_id: &str) -> Option<String> {
        self.models.get(model_id).cloned()
    }
}
