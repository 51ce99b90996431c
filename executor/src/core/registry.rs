//! Name-keyed registry of provider capabilities

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use shared::logging::Component;
use shared::{component_debug, normalize_provider_name};

use crate::traits::Provider;

/// Read-mostly map from provider name to provider capability
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the provider under `name`; names are case-insensitive
    pub fn register(&self, name: &str, provider: Arc<dyn Provider>) {
        let key = normalize_provider_name(name);
        let mut providers = self.providers.write().unwrap_or_else(|e| e.into_inner());
        if providers.insert(key.clone(), provider).is_some() {
            component_debug!(Component::Executor, "🔁 Replaced provider '{}'", key);
        } else {
            component_debug!(Component::Executor, "➕ Registered provider '{}'", key);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        providers.get(&normalize_provider_name(name)).cloned()
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
