//! Language adapters: turning entrypoint references into callable hooks

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::EntrypointContext;
use crate::metadata::ModMetadata;

/// A runnable entrypoint
///
/// Returning `Err` or panicking aborts the phase.
pub type Hook = Arc<dyn Fn(&EntrypointContext<'_>) -> Result<(), String> + Send + Sync>;

/// Creates hooks from the references in mod manifests
pub trait LanguageAdapter: Send + Sync + fmt::Debug {
    /// Instantiates `reference` declared by `owner`
    ///
    /// # Errors
    ///
    /// Returns a reason when the reference cannot be turned into a hook.
    fn create(&self, owner: &ModMetadata, reference: &str) -> Result<Hook, String>;
}

/// Hooks the host registered by reference name
///
/// Backs the `default` adapter.
#[derive(Clone, Default)]
pub struct EntrypointRegistry {
    hooks: BTreeMap<String, Hook>,
}

impl fmt::Debug for EntrypointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntrypointRegistry")
            .field("references", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EntrypointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook under a reference, replacing an earlier one
    pub fn register<F>(&mut self, reference: impl Into<String>, hook: F)
    where
        F: Fn(&EntrypointContext<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.hooks.insert(reference.into(), Arc::new(hook));
    }

    pub fn get(&self, reference: &str) -> Option<Hook> {
        self.hooks.get(reference).cloned()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// The `default` adapter: looks references up in an [`EntrypointRegistry`]
#[derive(Debug, Clone, Default)]
pub struct RegistryAdapter {
    registry: EntrypointRegistry,
}

impl RegistryAdapter {
    pub fn new(registry: EntrypointRegistry) -> Self {
        Self { registry }
    }
}

impl LanguageAdapter for RegistryAdapter {
    fn create(&self, _owner: &ModMetadata, reference: &str) -> Result<Hook, String> {
        self.registry
            .get(reference)
            .ok_or_else(|| format!("no entrypoint is registered as '{reference}'"))
    }
}
