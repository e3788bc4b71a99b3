//! Entrypoint dispatcher
//!
//! Runs the entrypoints of the resolved mods for one phase at a time. Mods
//! are visited in dependency order and each mod's entrypoints in declaration
//! order. Every entrypoint of a phase runs; any failure aborts the boot
//! once the phase is over.

pub mod adapter;
pub mod phase;

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::EntrypointError;
use crate::launch::GameArguments;
use crate::loader::LoaderHandle;
use crate::metadata::{EntrypointDescriptor, ModMetadata};
use crate::metadata::manifest::DEFAULT_ADAPTER;
pub use adapter::{EntrypointRegistry, Hook, LanguageAdapter, RegistryAdapter};
pub use phase::Phase;

/// What a hook sees while it runs
pub struct EntrypointContext<'a> {
    /// The mod that declared the entrypoint
    pub owner: &'a ModMetadata,
    pub phase: &'a Phase,
    pub reference: &'a str,
    pub arguments: &'a GameArguments,
    /// Read access to the loaded mod set
    pub loader: &'a LoaderHandle,
}

/// How one invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Completed,
    Failed(String),
}

/// Record of one entrypoint run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointInvocation {
    pub mod_id: String,
    pub phase: Phase,
    pub reference: String,
    pub outcome: InvocationOutcome,
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Dispatches entrypoint phases, each at most once
#[derive(Debug)]
pub struct EntrypointDispatcher {
    adapters: BTreeMap<String, Arc<dyn LanguageAdapter>>,
    dispatched: Mutex<BTreeSet<Phase>>,
    invocations: Mutex<Vec<EntrypointInvocation>>,
}

impl Default for EntrypointDispatcher {
    fn default() -> Self {
        Self::new(EntrypointRegistry::default())
    }
}

impl EntrypointDispatcher {
    /// Dispatcher whose `default` adapter serves hooks from `registry`
    pub fn new(registry: EntrypointRegistry) -> Self {
        let mut adapters: BTreeMap<String, Arc<dyn LanguageAdapter>> = BTreeMap::new();
        adapters.insert(
            DEFAULT_ADAPTER.to_string(),
            Arc::new(RegistryAdapter::new(registry)),
        );
        Self {
            adapters,
            dispatched: Mutex::new(BTreeSet::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Adds or replaces a language adapter
    pub fn register_adapter(&mut self, name: impl Into<String>, adapter: Arc<dyn LanguageAdapter>) {
        self.adapters.insert(name.into(), adapter);
    }

    pub fn was_dispatched(&self, phase: &Phase) -> bool {
        self.dispatched.lock().contains(phase)
    }

    /// Every invocation so far, in run order
    pub fn invocations(&self) -> Vec<EntrypointInvocation> {
        self.invocations.lock().clone()
    }

    /// Runs all entrypoints of a phase
    ///
    /// # Arguments
    ///
    /// * `phase` - Phase to run
    /// * `mods` - Resolved mods in dependency order
    /// * `arguments` - Game arguments passed to hooks
    /// * `loader` - Handle passed to hooks
    ///
    /// # Returns
    ///
    /// The number of entrypoints that completed
    ///
    /// # Errors
    ///
    /// Returns [`EntrypointError::AlreadyDispatched`] on a second call for the
    /// same phase. Otherwise every entrypoint of the phase runs; a single
    /// adapter, creation or hook failure is returned as is, several are
    /// returned together as [`EntrypointError::PhaseFailed`].
    pub fn dispatch(
        &self,
        phase: &Phase,
        mods: &[Arc<ModMetadata>],
        arguments: &GameArguments,
        loader: &LoaderHandle,
    ) -> Result<usize, EntrypointError> {
        if !self.dispatched.lock().insert(phase.clone()) {
            return Err(EntrypointError::AlreadyDispatched {
                phase: phase.to_string(),
            });
        }

        let mut count = 0;
        let mut failures = Vec::new();
        for owner in mods {
            for descriptor in owner.entrypoints_for(phase.as_str()) {
                match self.invoke(phase, owner, descriptor, arguments, loader) {
                    Ok(()) => count += 1,
                    Err(e) => failures.push(e),
                }
            }
        }

        if failures.len() > 1 {
            return Err(EntrypointError::PhaseFailed {
                phase: phase.to_string(),
                failures,
            });
        }
        if let Some(failure) = failures.pop() {
            return Err(failure);
        }
        info!(target: "leaf::entrypoint", phase = %phase, count, "Entrypoint phase finished");
        Ok(count)
    }

    fn invoke(
        &self,
        phase: &Phase,
        owner: &ModMetadata,
        descriptor: &EntrypointDescriptor,
        arguments: &GameArguments,
        loader: &LoaderHandle,
    ) -> Result<(), EntrypointError> {
        let adapter = self.adapters.get(&descriptor.adapter).ok_or_else(|| {
            EntrypointError::UnknownAdapter {
                mod_id: owner.id.clone(),
                adapter: descriptor.adapter.clone(),
            }
        })?;
        let hook = adapter
            .create(owner, &descriptor.reference)
            .map_err(|reason| EntrypointError::CreateFailed {
                mod_id: owner.id.clone(),
                phase: phase.to_string(),
                reference: descriptor.reference.clone(),
                reason,
            })?;

        let context = EntrypointContext {
            owner,
            phase,
            reference: &descriptor.reference,
            arguments,
            loader,
        };
        debug!(
            target: "leaf::entrypoint",
            phase = %phase,
            mod_id = %owner.id,
            reference = %descriptor.reference,
            "Running entrypoint"
        );
        let result = catch_unwind(AssertUnwindSafe(|| hook(&context)))
            .unwrap_or_else(|payload| Err(panic_reason(payload.as_ref())));

        let outcome = match &result {
            Ok(()) => InvocationOutcome::Completed,
            Err(reason) => InvocationOutcome::Failed(reason.clone()),
        };
        self.invocations.lock().push(EntrypointInvocation {
            mod_id: owner.id.clone(),
            phase: phase.clone(),
            reference: descriptor.reference.clone(),
            outcome,
        });

        result.map_err(|reason| {
            error!(
                target: "leaf::entrypoint",
                phase = %phase,
                mod_id = %owner.id,
                reference = %descriptor.reference,
                "Entrypoint failed: {reason}"
            );
            EntrypointError::HookFailed {
                mod_id: owner.id.clone(),
                phase: phase.to_string(),
                reference: descriptor.reference.clone(),
                reason,
            }
        })
    }
}
