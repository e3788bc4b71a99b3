//! Loader orchestrator
//!
//! Drives one boot from a cold start to a running game:
//!
//! ```text
//! Cold ─► Scanning ─► Resolving ─► PipelineReady ─► EntrypointsRunning ─► Running
//!            │            │              │                  │
//!            └────────────┴──────────────┴──────────────────┴─────► Failed
//! ```
//!
//! The [`Loader`] owns the boot and is the only writer. Everything else
//! reads through a [`LoaderHandle`], which swaps in an immutable snapshot
//! each time the loader moves on.

pub mod report;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info};

use crate::config::LoaderConfig;
use crate::discovery::{ScanReport, Scanner};
use crate::entrypoint::{EntrypointDispatcher, EntrypointRegistry, LanguageAdapter, Phase};
use crate::error::{LoaderError, QueryError, Result, invalid_phase};
use crate::gate::{ClassDefiner, ClassSource, GateConfig, InMemoryDefiner, LoadingGate, open_source};
use crate::launch::GameArguments;
use crate::libraries::{LibraryLayout, LibraryManifest, VerifiedLibrary};
use crate::metadata::ModMetadata;
use crate::resolver::{Resolution, ResolveOptions, Resolver};
use crate::transform::{Pipeline, PipelineOptions};
pub use report::{BootReport, format_mod_list};

/// Where a boot currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoaderPhase {
    #[default]
    Cold,
    Scanning,
    Resolving,
    PipelineReady,
    EntrypointsRunning,
    Running,
    Failed,
}

impl LoaderPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            LoaderPhase::Cold => "cold",
            LoaderPhase::Scanning => "scanning",
            LoaderPhase::Resolving => "resolving",
            LoaderPhase::PipelineReady => "pipeline-ready",
            LoaderPhase::EntrypointsRunning => "running entrypoints",
            LoaderPhase::Running => "running",
            LoaderPhase::Failed => "failed",
        }
    }

    /// Whether mod queries can be answered
    pub fn has_mod_set(self) -> bool {
        matches!(
            self,
            LoaderPhase::PipelineReady | LoaderPhase::EntrypointsRunning | LoaderPhase::Running
        )
    }
}

impl fmt::Display for LoaderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    phase: LoaderPhase,
    /// Stage that was running when the loader failed
    failed_stage: Option<LoaderPhase>,
    mods: BTreeMap<String, Arc<ModMetadata>>,
    order: Vec<Arc<ModMetadata>>,
    gate: Option<Arc<LoadingGate>>,
}

/// Read-only view of a loader
///
/// Cloning is cheap; all clones observe the same loader. The default handle
/// belongs to no loader and stays cold forever.
#[derive(Debug, Clone, Default)]
pub struct LoaderHandle {
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
}

impl LoaderHandle {
    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.write() = Arc::new(snapshot);
    }

    fn available(&self) -> std::result::Result<Arc<Snapshot>, QueryError> {
        let snapshot = self.current();
        if snapshot.phase.has_mod_set() {
            return Ok(snapshot);
        }
        if let Some(stage) = snapshot.failed_stage {
            return Err(QueryError::LoaderFailed {
                stage: stage.to_string(),
            });
        }
        Err(QueryError::NotYetAvailable {
            phase: snapshot.phase.to_string(),
        })
    }

    pub fn phase(&self) -> LoaderPhase {
        self.current().phase
    }

    /// Metadata of a loaded mod
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NotYetAvailable`] before the pipeline is
    /// installed and [`QueryError::LoaderFailed`] after a failed boot.
    pub fn get_mod(&self, id: &str) -> std::result::Result<Option<Arc<ModMetadata>>, QueryError> {
        Ok(self.available()?.mods.get(id).cloned())
    }

    /// Whether a mod with this id is loaded
    ///
    /// # Errors
    ///
    /// See [`LoaderHandle::get_mod`].
    pub fn is_mod_loaded(&self, id: &str) -> std::result::Result<bool, QueryError> {
        Ok(self.available()?.mods.contains_key(id))
    }

    /// Loaded mods in dependency order
    ///
    /// # Errors
    ///
    /// See [`LoaderHandle::get_mod`].
    pub fn mods(&self) -> std::result::Result<Vec<Arc<ModMetadata>>, QueryError> {
        Ok(self.available()?.order.clone())
    }

    /// The loading gate serving class requests
    ///
    /// # Errors
    ///
    /// See [`LoaderHandle::get_mod`].
    pub fn gate(&self) -> std::result::Result<Arc<LoadingGate>, QueryError> {
        let snapshot = self.available()?;
        snapshot.gate.clone().ok_or_else(|| QueryError::NotYetAvailable {
            phase: snapshot.phase.to_string(),
        })
    }

    /// Makes this handle the process-wide one returned by [`global`]
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::GlobalAlreadyInstalled`] when a handle is
    /// already installed.
    pub fn install_global(&self) -> std::result::Result<(), QueryError> {
        let mut global = GLOBAL.write();
        if global.is_some() {
            return Err(QueryError::GlobalAlreadyInstalled);
        }
        *global = Some(self.clone());
        debug!(target: "leaf::loader", "Global loader handle installed");
        Ok(())
    }
}

static GLOBAL: RwLock<Option<LoaderHandle>> = parking_lot::const_rwlock(None);

/// The process-wide loader handle
///
/// # Errors
///
/// Returns [`QueryError::GlobalNotInstalled`] before
/// [`LoaderHandle::install_global`] was called.
pub fn global() -> std::result::Result<LoaderHandle, QueryError> {
    GLOBAL.read().clone().ok_or(QueryError::GlobalNotInstalled)
}

/// Removes the process-wide handle, returning it
pub fn uninstall_global() -> Option<LoaderHandle> {
    GLOBAL.write().take()
}

/// Owns one boot of the loader
pub struct Loader {
    config: LoaderConfig,
    phase: LoaderPhase,
    handle: LoaderHandle,
    registry: EntrypointRegistry,
    adapters: Vec<(String, Arc<dyn LanguageAdapter>)>,
    dispatcher: Option<EntrypointDispatcher>,
    definer: Arc<dyn ClassDefiner>,
    class_sources: Vec<Box<dyn ClassSource>>,
    arguments: GameArguments,
    scan: Option<ScanReport>,
    resolution: Option<Resolution>,
    gate: Option<Arc<LoadingGate>>,
    libraries: Vec<VerifiedLibrary>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("phase", &self.phase)
            .field("game_dir", &self.config.game_dir)
            .finish_non_exhaustive()
    }
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            phase: LoaderPhase::Cold,
            handle: LoaderHandle::default(),
            registry: EntrypointRegistry::new(),
            adapters: Vec::new(),
            dispatcher: None,
            definer: Arc::new(InMemoryDefiner::new()),
            class_sources: Vec::new(),
            arguments: GameArguments::new(),
            scan: None,
            resolution: None,
            gate: None,
            libraries: Vec::new(),
        }
    }

    /// Hooks served by the `default` adapter
    #[must_use]
    pub fn with_registry(mut self, registry: EntrypointRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_adapter(
        mut self,
        name: impl Into<String>,
        adapter: Arc<dyn LanguageAdapter>,
    ) -> Self {
        self.adapters.push((name.into(), adapter));
        self
    }

    #[must_use]
    pub fn with_definer(mut self, definer: Arc<dyn ClassDefiner>) -> Self {
        self.definer = definer;
        self
    }

    /// Extra class source consulted after the configured class path
    #[must_use]
    pub fn with_class_source(mut self, source: Box<dyn ClassSource>) -> Self {
        self.class_sources.push(source);
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: GameArguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub fn handle(&self) -> LoaderHandle {
        self.handle.clone()
    }

    pub fn arguments(&self) -> &GameArguments {
        &self.arguments
    }

    pub fn scan_report(&self) -> Option<&ScanReport> {
        self.scan.as_ref()
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn libraries(&self) -> &[VerifiedLibrary] {
        &self.libraries
    }

    pub fn dispatcher(&self) -> Option<&EntrypointDispatcher> {
        self.dispatcher.as_ref()
    }

    fn require(&self, operation: &str, allowed: &[LoaderPhase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(invalid_phase(operation, self.phase))
        }
    }

    fn enter(&mut self, phase: LoaderPhase) {
        debug!(target: "leaf::loader", from = %self.phase, to = %phase, "Loader phase change");
        self.phase = phase;
        self.publish(None);
    }

    fn publish(&self, failed_stage: Option<LoaderPhase>) {
        let (mods, order) = match (&self.resolution, self.phase.has_mod_set()) {
            (Some(resolution), true) => (resolution.mods.clone(), resolution.ordered()),
            _ => (BTreeMap::new(), Vec::new()),
        };
        self.handle.publish(Snapshot {
            phase: self.phase,
            failed_stage,
            mods,
            order,
            gate: self.gate.clone(),
        });
    }

    /// Moves to `Failed`, remembering the stage that was running
    fn fail(&mut self, error: impl Into<LoaderError>) -> LoaderError {
        let error = error.into();
        let stage = self.phase;
        error!(
            target: "leaf::loader",
            stage = %stage,
            component = %error.component(),
            "Boot failed: {error}"
        );
        self.phase = LoaderPhase::Failed;
        self.gate = None;
        self.publish(Some(stage));
        error
    }

    /// Scans for mod candidates
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidPhase`] unless the loader is cold, or a
    /// configuration error for malformed versions.
    pub fn discover(&mut self) -> Result<&ScanReport> {
        self.require("discover mods", &[LoaderPhase::Cold])?;
        self.enter(LoaderPhase::Scanning);

        let options = match self.config.scan_options() {
            Ok(options) => options,
            Err(e) => return Err(self.fail(e)),
        };
        Ok(self.scan.insert(Scanner::new(options).scan()))
    }

    /// Selects one version per discovered mod id
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidPhase`] unless discovery ran, or
    /// [`LoaderError::Resolution`] for an incompatible mod set.
    pub fn resolve(&mut self) -> Result<&Resolution> {
        self.require("resolve mods", &[LoaderPhase::Scanning])?;
        let Some(scan) = self.scan.as_ref() else {
            return Err(invalid_phase("resolve mods", self.phase));
        };
        let candidates = scan.candidates.clone();
        self.enter(LoaderPhase::Resolving);

        let resolver = Resolver::new(ResolveOptions {
            load_late: self.config.load_late_ids(),
        });
        match resolver.resolve(&candidates) {
            Ok(resolution) => Ok(self.resolution.insert(resolution)),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn verify_libraries(&self) -> Result<Vec<VerifiedLibrary>> {
        let Some(path) = self.config.effective_library_manifest() else {
            debug!(target: "leaf::loader", "No library manifest configured");
            return Ok(Vec::new());
        };
        let manifest = LibraryManifest::load(&path)?;
        let layout = LibraryLayout {
            libraries_dir: self.config.effective_libraries_dir(),
            loader_jars_dir: self.config.effective_loader_jars_dir(),
        };
        Ok(layout.verify(&manifest, self.config.side, self.config.development)?)
    }

    fn build_gate(&mut self, mods: &[Arc<ModMetadata>]) -> Result<LoadingGate> {
        let mappings = self.config.load_mappings()?;
        let pipeline = Pipeline::for_mods(
            mods,
            &PipelineOptions {
                side: self.config.side,
                mappings: mappings.clone(),
            },
        );

        let mut sources = Vec::new();
        for path in self.config.effective_class_path() {
            sources.push(open_source(&path)?);
        }
        sources.append(&mut self.class_sources);

        Ok(LoadingGate::new(GateConfig {
            authority: self.config.authority()?,
            sources,
            pipeline: Arc::new(pipeline),
            definer: Arc::clone(&self.definer),
            mappings,
        }))
    }

    /// Verifies libraries, builds the pipeline and opens the loading gate
    ///
    /// Classes listed in `eager_classes` are transformed before the gate is
    /// published.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidPhase`] unless resolution succeeded,
    /// then any integrity, configuration, gate or transform error.
    pub fn install_pipeline(&mut self) -> Result<Arc<LoadingGate>> {
        self.require("install the class pipeline", &[LoaderPhase::Resolving])?;
        let Some(mods) = self.resolution.as_ref().map(Resolution::ordered) else {
            return Err(invalid_phase("install the class pipeline", self.phase));
        };

        self.libraries = match self.verify_libraries() {
            Ok(libraries) => libraries,
            Err(e) => return Err(self.fail(e)),
        };
        let gate = match self.build_gate(&mods) {
            Ok(gate) => Arc::new(gate),
            Err(e) => return Err(self.fail(e)),
        };

        for name in self.config.eager_classes.clone() {
            if let Err(e) = gate.load_class(&name) {
                return Err(self.fail(e));
            }
        }

        info!(target: "leaf::loader", "{}", format_mod_list(&mods).trim_end());
        self.gate = Some(Arc::clone(&gate));
        self.enter(LoaderPhase::PipelineReady);
        Ok(gate)
    }

    fn ensure_dispatcher(&mut self) -> &EntrypointDispatcher {
        self.dispatcher.get_or_insert_with(|| {
            let mut dispatcher = EntrypointDispatcher::new(std::mem::take(&mut self.registry));
            for (name, adapter) in self.adapters.drain(..) {
                dispatcher.register_adapter(name, adapter);
            }
            dispatcher
        })
    }

    /// Runs one entrypoint phase across the resolved mods
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidPhase`] before the pipeline is installed
    /// or after the loader finished, or the dispatcher's error.
    pub fn run_entrypoints(&mut self, phase: &Phase) -> Result<usize> {
        self.require(
            "run entrypoints",
            &[LoaderPhase::PipelineReady, LoaderPhase::EntrypointsRunning],
        )?;
        let mods = self
            .resolution
            .as_ref()
            .map(Resolution::ordered)
            .unwrap_or_default();
        if self.phase != LoaderPhase::EntrypointsRunning {
            self.enter(LoaderPhase::EntrypointsRunning);
        }

        let handle = self.handle.clone();
        let arguments = self.arguments.clone();
        let result = self.ensure_dispatcher().dispatch(phase, &mods, &arguments, &handle);
        result.map_err(|e| self.fail(e))
    }

    /// Marks the boot complete
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::InvalidPhase`] before the pipeline is installed.
    pub fn finish(&mut self) -> Result<()> {
        self.require(
            "finish booting",
            &[LoaderPhase::PipelineReady, LoaderPhase::EntrypointsRunning],
        )?;
        self.enter(LoaderPhase::Running);
        info!(target: "leaf::loader", "Loader running");
        Ok(())
    }

    /// Runs every boot step in order
    ///
    /// Entrypoints run for `preLaunch`, `main` and the configured side. A dry
    /// run stops after discovery.
    ///
    /// # Errors
    ///
    /// Returns the first error of any step; the loader is then `Failed`.
    pub fn boot(&mut self) -> Result<BootReport> {
        let (discovered, skipped) = {
            let scan = self.discover()?;
            (scan.candidates.len(), scan.diagnostics.len())
        };
        if self.config.dry_run {
            info!(target: "leaf::loader", discovered, "Dry run: stopping after discovery");
            return Ok(BootReport {
                phase: self.phase,
                discovered,
                skipped,
                ..BootReport::default()
            });
        }

        self.resolve()?;
        let gate = self.install_pipeline()?;
        let mut entrypoints_run = 0;
        for phase in Phase::boot_sequence(self.config.side) {
            entrypoints_run += self.run_entrypoints(&phase)?;
        }
        self.finish()?;

        Ok(BootReport {
            phase: self.phase,
            discovered,
            skipped,
            mods: self.resolution.as_ref().map(Resolution::ordered).unwrap_or_default(),
            entrypoints_run,
            classes_defined: gate.records().len(),
            libraries_verified: self.libraries.len(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Component;

    fn loader() -> (tempfile::TempDir, Loader) {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let config = LoaderConfig::for_game_dir(temp.path());
        (temp, Loader::new(config))
    }

    #[test]
    fn test_default_handle_is_cold() {
        let handle = LoaderHandle::default();
        assert_eq!(handle.phase(), LoaderPhase::Cold);
        assert!(matches!(
            handle.is_mod_loaded("game"),
            Err(QueryError::NotYetAvailable { .. })
        ));
    }

    #[test]
    fn test_steps_in_order() {
        let (_temp, mut loader) = loader();
        let handle = loader.handle();

        loader.discover().expect("discover");
        assert!(handle.mods().is_err());
        loader.resolve().expect("resolve");
        loader.install_pipeline().expect("install");

        assert_eq!(handle.phase(), LoaderPhase::PipelineReady);
        assert!(handle.is_mod_loaded("game").expect("query"));
        assert!(handle.is_mod_loaded("leafloader").expect("query"));
        assert!(!handle.is_mod_loaded("missing").expect("query"));

        loader.run_entrypoints(&Phase::PreLaunch).expect("entrypoints");
        loader.finish().expect("finish");
        assert_eq!(handle.phase(), LoaderPhase::Running);
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let (_temp, mut loader) = loader();
        assert!(matches!(
            loader.resolve(),
            Err(LoaderError::InvalidPhase { .. })
        ));
        assert!(matches!(
            loader.run_entrypoints(&Phase::Main),
            Err(LoaderError::InvalidPhase { .. })
        ));
        // Rejection leaves the loader where it was
        assert_eq!(loader.phase(), LoaderPhase::Cold);
        loader.discover().expect("discover");
        assert!(matches!(
            loader.discover(),
            Err(LoaderError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_failure_is_visible_to_readers() {
        let (temp, _) = loader();
        let mut config = LoaderConfig::for_game_dir(temp.path());
        config.library_manifest = Some(temp.path().join("missing.json"));
        let mut loader = Loader::new(config);
        let handle = loader.handle();

        loader.discover().expect("discover");
        loader.resolve().expect("resolve");
        let err = loader.install_pipeline().expect_err("manifest is missing");

        assert_eq!(err.component(), Component::Libraries);
        assert_eq!(loader.phase(), LoaderPhase::Failed);
        assert!(matches!(
            handle.get_mod("game"),
            Err(QueryError::LoaderFailed { ref stage }) if stage == "resolving"
        ));
    }

    #[test]
    fn test_dry_run_stops_after_discovery() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let mut config = LoaderConfig::for_game_dir(temp.path());
        config.dry_run = true;
        let mut loader = Loader::new(config);

        let report = loader.boot().expect("boot");
        assert!(report.is_dry_run());
        assert_eq!(report.discovered, 2);
        assert!(loader.resolution().is_none());
    }
}
