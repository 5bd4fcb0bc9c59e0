//! Provider registry.
//!
//! Maps artifact types to the provider serving them. The registry is built
//! explicitly at startup and handed to the server by reference; there is no
//! global registration point, so tests can assemble whatever combination
//! they need.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;

use crate::provider::ContentProvider;

/// Registry statistics for the status report.
#[derive(Clone, Debug, Serialize)]
pub struct RegistryStats {
    /// Number of distinct providers.
    pub providers: usize,
    /// Number of registered artifact types.
    pub types: usize,
    /// Types served per provider id, sorted for stable output.
    pub by_provider: BTreeMap<String, Vec<String>>,
}

/// Artifact-type to provider mapping.
///
/// Registering a provider claims every type it reports. When two providers
/// claim the same type, the later registration wins.
#[derive(Default)]
pub struct ProviderRegistry {
    by_type: HashMap<String, Arc<dyn ContentProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_type: HashMap::new(),
        }
    }

    /// Register a provider for all types it serves.
    pub fn register(&mut self, provider: Arc<dyn ContentProvider>) {
        for item_type in provider.types() {
            if let Some(previous) = self
                .by_type
                .insert(item_type.clone(), Arc::clone(&provider))
            {
                tracing::warn!(
                    item_type = %item_type,
                    previous = %previous.id(),
                    replacement = %provider.id(),
                    "Artifact type re-registered, later provider wins"
                );
            }
        }
    }

    /// Provider serving an artifact type.
    #[must_use]
    pub fn get(&self, item_type: &str) -> Option<&Arc<dyn ContentProvider>> {
        self.by_type.get(item_type)
    }

    /// Whether any provider serves this type.
    #[must_use]
    pub fn has_type(&self, item_type: &str) -> bool {
        self.by_type.contains_key(item_type)
    }

    /// Registered artifact types, sorted.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.by_type.keys().cloned().collect();
        types.sort();
        types
    }

    /// Iterate over registered types and their providers.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn ContentProvider>)> {
        self.by_type.iter()
    }

    /// Statistics for the status report.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut by_provider: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (item_type, provider) in &self.by_type {
            by_provider
                .entry(provider.id().to_owned())
                .or_default()
                .push(item_type.clone());
        }
        for types in by_provider.values_mut() {
            types.sort();
        }

        RegistryStats {
            providers: by_provider.len(),
            types: self.by_type.len(),
            by_provider,
        }
    }
}
