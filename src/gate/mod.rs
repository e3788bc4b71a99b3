//! Loading gate
//!
//! Sits between the host's class requests and the transform pipeline:
//!
//! ```text
//! request ──► authority? ──no──► Delegated
//!                │yes
//!                ▼
//!          slot for name ──► Reading ──► Transforming ──► Defined
//!          (compute once)    │  │              │
//!                            │  └──────────────┴────────► Failed
//!                            └─ in no source ───────────► Delegated
//! ```
//!
//! A covered name that no source holds (platform classes such as
//! `java/lang/Object`) is handed back to the host and its slot dropped, so
//! it never becomes a memoized failure. With mappings active only runtime
//! names are served; a source name that the mappings rename is rejected,
//! which keeps one definition per class.
//!
//! Each class name owns a slot. The slot map lock is held only to find or
//! create the slot; the work runs inside the slot's once-cell, so distinct
//! names load in parallel while concurrent requests for one name wait for a
//! single computation. Terminal results are kept for the life of the gate.

pub mod authority;
pub mod definer;
pub mod source;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::error::GateError;
use crate::hash::fingerprint;
use crate::transform::Pipeline;
use crate::transform::remap::Mappings;
pub use authority::{Authority, LOADER_NAMESPACE};
pub use definer::{ClassDefiner, InMemoryDefiner};
pub use source::{ClassSource, DirectorySource, MemorySource, ZipSource, open_source};

/// Lifecycle of one class name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    Unrequested,
    Reading,
    Transforming,
    Defined,
    Failed,
}

impl fmt::Display for ClassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClassState::Unrequested => "unrequested",
            ClassState::Reading => "reading",
            ClassState::Transforming => "transforming",
            ClassState::Defined => "defined",
            ClassState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A class the gate transformed and defined
#[derive(Debug)]
pub struct DefinedClass {
    /// Runtime name the class was requested and defined under
    pub name: String,
    /// Name the original bytes were read under
    pub source_name: String,
    pub bytes: Vec<u8>,
    pub fingerprint: String,
    pub original_fingerprint: String,
    pub definition_id: u64,
}

impl DefinedClass {
    /// Whether the pipeline changed the bytes
    pub fn is_transformed(&self) -> bool {
        self.fingerprint != self.original_fingerprint
    }
}

/// Answer to a class request
#[derive(Debug, Clone)]
pub enum ClassLoad {
    /// Transformed and defined by the gate
    Defined(Arc<DefinedClass>),
    /// Outside the gate's authority; the host loads it normally
    Delegated,
}

impl ClassLoad {
    pub fn defined(&self) -> Option<&Arc<DefinedClass>> {
        match self {
            ClassLoad::Defined(class) => Some(class),
            ClassLoad::Delegated => None,
        }
    }
}

/// Summary of one defined class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClassRecord {
    pub name: String,
    pub fingerprint: String,
    pub definition_id: u64,
    pub size: usize,
    pub transformed: bool,
}

/// Outcome of re-running the pipeline for a defined class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub name: String,
    pub recorded: String,
    pub replayed: String,
}

impl ReplayReport {
    pub fn matches(&self) -> bool {
        self.recorded == self.replayed
    }
}

/// `Ok(None)`: no source holds the class
type SlotResult = Result<Option<Arc<DefinedClass>>, GateError>;

#[derive(Debug)]
struct Slot {
    state: Mutex<ClassState>,
    result: OnceLock<SlotResult>,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: Mutex::new(ClassState::Unrequested),
            result: OnceLock::new(),
        }
    }

    fn set_state(&self, state: ClassState) {
        *self.state.lock() = state;
    }
}

/// Parts a gate is assembled from
pub struct GateConfig {
    pub authority: Authority,
    pub sources: Vec<Box<dyn ClassSource>>,
    pub pipeline: Arc<Pipeline>,
    pub definer: Arc<dyn ClassDefiner>,
    /// When set, requested runtime names are mapped back to source names
    pub mappings: Option<Arc<Mappings>>,
}

/// Serves class requests through the transform pipeline
pub struct LoadingGate {
    authority: Authority,
    sources: Vec<Box<dyn ClassSource>>,
    pipeline: Arc<Pipeline>,
    definer: Arc<dyn ClassDefiner>,
    mappings: Option<Arc<Mappings>>,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl fmt::Debug for LoadingGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingGate")
            .field("sources", &self.sources)
            .field("slots", &self.slots.lock().len())
            .finish_non_exhaustive()
    }
}

/// Normalizes `a.b.C` to `a/b/C` and rejects malformed names
fn normalize_name(name: &str) -> Result<String, GateError> {
    let normalized = name.replace('.', "/");
    let valid = !normalized.is_empty()
        && normalized
            .split('/')
            .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace));
    if valid {
        Ok(normalized)
    } else {
        Err(GateError::InvalidName {
            name: name.to_string(),
        })
    }
}

impl LoadingGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            authority: config.authority,
            sources: config.sources,
            pipeline: config.pipeline,
            definer: config.definer,
            mappings: config.mappings,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Whether a class name is served by the gate
    pub fn covers(&self, name: &str) -> bool {
        normalize_name(name).is_ok_and(|n| self.authority.covers(&n))
    }

    /// Loads a class, transforming and defining it on first request
    ///
    /// Every request for the same name returns the same [`DefinedClass`]
    /// or the same error.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidName`] for a malformed name,
    /// [`GateError::SourceName`] for a name the mappings rename, or the
    /// memoized failure of reading, transforming or defining the class.
    pub fn load_class(&self, name: &str) -> Result<ClassLoad, GateError> {
        let name = normalize_name(name)?;
        if !self.authority.covers(&name) {
            trace!(target: "leaf::gate", class = %name, "Delegating class");
            return Ok(ClassLoad::Delegated);
        }
        let source_name = self.source_name(&name)?;

        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(name.clone()).or_insert_with(|| Arc::new(Slot::new())))
        };

        let result = slot
            .result
            .get_or_init(|| self.compute(&name, &source_name, &slot))
            .clone()?;
        match result {
            Some(class) => Ok(ClassLoad::Defined(class)),
            None => {
                let mut slots = self.slots.lock();
                if slots.get(&name).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                    slots.remove(&name);
                }
                trace!(target: "leaf::gate", class = %name, "Not in any class source, delegating");
                Ok(ClassLoad::Delegated)
            }
        }
    }

    fn compute(&self, name: &str, source_name: &str, slot: &Slot) -> SlotResult {
        let result = self.read_transform_define(name, source_name, slot);
        match &result {
            Ok(None) => slot.set_state(ClassState::Unrequested),
            Ok(Some(class)) => {
                slot.set_state(ClassState::Defined);
                debug!(
                    target: "leaf::gate",
                    class = %name,
                    id = class.definition_id,
                    transformed = class.is_transformed(),
                    "Defined class"
                );
            }
            Err(e) => {
                slot.set_state(ClassState::Failed);
                error!(target: "leaf::gate", class = %name, "Class load failed: {e}");
            }
        }
        result
    }

    fn read_transform_define(&self, name: &str, source_name: &str, slot: &Slot) -> SlotResult {
        slot.set_state(ClassState::Reading);
        let Some(original) = self.read_original(name, source_name)? else {
            return Ok(None);
        };

        slot.set_state(ClassState::Transforming);
        let bytes = self.pipeline.transform(source_name, &original)?;

        let definition_id =
            self.definer
                .define(name, &bytes)
                .map_err(|reason| GateError::DefineFailed {
                    name: name.to_string(),
                    reason,
                })?;

        Ok(Some(Arc::new(DefinedClass {
            name: name.to_string(),
            source_name: source_name.to_string(),
            fingerprint: fingerprint(&bytes),
            original_fingerprint: fingerprint(&original),
            bytes,
            definition_id,
        })))
    }

    /// Source name of a runtime name
    ///
    /// The round trip must lead back to `name`; otherwise `name` is a source
    /// name whose class is served under another runtime name.
    fn source_name(&self, name: &str) -> Result<String, GateError> {
        let Some(mappings) = &self.mappings else {
            return Ok(name.to_string());
        };
        let source = mappings.unmap_class(name);
        let runtime = mappings.map_class(source);
        if runtime != name {
            return Err(GateError::SourceName {
                name: name.to_string(),
                runtime: runtime.to_string(),
            });
        }
        Ok(source.to_string())
    }

    fn read_original(&self, name: &str, source_name: &str) -> Result<Option<Vec<u8>>, GateError> {
        for source in &self.sources {
            if let Some(bytes) = source.read_class(source_name)? {
                trace!(
                    target: "leaf::gate",
                    class = %name,
                    source = %source.describe(),
                    "Read class"
                );
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    /// Current state of a class name
    pub fn state(&self, name: &str) -> ClassState {
        let Ok(name) = normalize_name(name) else {
            return ClassState::Unrequested;
        };
        self.slots
            .lock()
            .get(&name)
            .map_or(ClassState::Unrequested, |slot| *slot.state.lock())
    }

    /// Defined classes, sorted by name
    pub fn records(&self) -> Vec<LoadedClassRecord> {
        let slots: Vec<Arc<Slot>> = self.slots.lock().values().cloned().collect();
        let mut records: Vec<LoadedClassRecord> = slots
            .iter()
            .filter_map(|slot| slot.result.get())
            .filter_map(|result| result.as_ref().ok().and_then(Option::as_ref))
            .map(|class| LoadedClassRecord {
                name: class.name.clone(),
                fingerprint: class.fingerprint.clone(),
                definition_id: class.definition_id,
                size: class.bytes.len(),
                transformed: class.is_transformed(),
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// Re-runs the pipeline on the original bytes of a defined class
    ///
    /// Nothing is defined again; the report compares fingerprints.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::ClassNotFound`] when the class was never defined,
    /// or the read/transform error of the replay.
    pub fn replay(&self, name: &str) -> Result<ReplayReport, GateError> {
        let name = normalize_name(name)?;
        let defined = self
            .slots
            .lock()
            .get(&name)
            .and_then(|slot| slot.result.get().cloned())
            .and_then(Result::ok)
            .flatten()
            .ok_or_else(|| GateError::ClassNotFound { name: name.clone() })?;

        let original = self
            .read_original(&name, &defined.source_name)?
            .ok_or_else(|| GateError::ClassNotFound { name: name.clone() })?;
        let bytes = self.pipeline.transform(&defined.source_name, &original)?;
        let report = ReplayReport {
            name,
            recorded: defined.fingerprint.clone(),
            replayed: fingerprint(&bytes),
        };
        if !report.matches() {
            error!(
                target: "leaf::gate",
                class = %report.name,
                recorded = %report.recorded,
                replayed = %report.replayed,
                "Replay produced different bytes"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::metadata::{ModMetadata, Version};
    use crate::transform::PipelineOptions;
    use crate::transform::access::parse_rule_line;
    use crate::transform::class::{Access, ClassImage, FieldInfo};

    fn class_bytes(name: &str) -> Vec<u8> {
        let mut image = ClassImage::new(name);
        image.fields.push(FieldInfo {
            name: "health".to_string(),
            descriptor: "I".to_string(),
            access: Access::PRIVATE,
            environment: None,
        });
        image.encode().expect("encode")
    }

    fn gate_with(rule: &str, definer: Arc<InMemoryDefiner>) -> LoadingGate {
        let mut meta = ModMetadata::builtin("examplemod", Version::new([1]), "Example");
        meta.access_rules
            .extend(parse_rule_line("examplemod", rule).expect("valid rule"));
        let pipeline = Pipeline::for_mods(&[Arc::new(meta)], &PipelineOptions::default());
        LoadingGate::new(GateConfig {
            authority: Authority::everything().expect("authority"),
            sources: vec![Box::new(
                MemorySource::new()
                    .with_class("net/game/Player", class_bytes("net/game/Player"))
                    .with_class("net/game/World", class_bytes("net/game/World"))
                    .with_class("dev/leaf/loader/Boot", class_bytes("dev/leaf/loader/Boot")),
            )],
            pipeline: Arc::new(pipeline),
            definer,
            mappings: None,
        })
    }

    #[test]
    fn test_load_class_is_memoized() {
        let definer = Arc::new(InMemoryDefiner::new());
        let gate = gate_with("accessible field net/game/Player health I", definer.clone());

        assert_eq!(gate.state("net/game/Player"), ClassState::Unrequested);
        let first = gate.load_class("net/game/Player").expect("load");
        let second = gate.load_class("net.game.Player").expect("load");

        let (Some(a), Some(b)) = (first.defined(), second.defined()) else {
            panic!("expected defined classes");
        };
        assert!(Arc::ptr_eq(a, b));
        assert!(a.is_transformed());
        assert_eq!(definer.defined_count(), 1);
        assert_eq!(gate.state("net/game/Player"), ClassState::Defined);
    }

    #[test]
    fn test_loader_namespace_is_delegated() {
        let gate = gate_with("accessible class net/game/World", Arc::new(InMemoryDefiner::new()));
        assert!(matches!(
            gate.load_class("dev/leaf/loader/Boot").expect("load"),
            ClassLoad::Delegated
        ));
        assert!(!gate.covers("dev/leaf/loader/Boot"));
    }

    #[test]
    fn test_failure_is_memoized() {
        let definer = Arc::new(InMemoryDefiner::new());
        let gate = gate_with("accessible field net/game/World stamina F", definer.clone());

        let first = gate.load_class("net/game/World").expect_err("missing target");
        let second = gate.load_class("net/game/World").expect_err("missing target");
        assert_eq!(first, second);
        assert!(matches!(first, GateError::Transform(_)));
        assert_eq!(gate.state("net/game/World"), ClassState::Failed);
        assert_eq!(definer.defined_count(), 0);
    }

    #[test]
    fn test_class_in_no_source_is_delegated() {
        let gate = gate_with("accessible class net/game/World", Arc::new(InMemoryDefiner::new()));
        for _ in 0..2 {
            assert!(matches!(
                gate.load_class("java.lang.Object").expect("load"),
                ClassLoad::Delegated
            ));
        }
        assert!(gate.covers("java/lang/Object"));
        assert_eq!(gate.state("java/lang/Object"), ClassState::Unrequested);
        assert!(gate.records().is_empty());
    }

    #[test]
    fn test_invalid_name() {
        let gate = gate_with("accessible class net/game/World", Arc::new(InMemoryDefiner::new()));
        for name in ["", "net//Player", "net/game/", "net/game/Bad Name"] {
            assert!(matches!(
                gate.load_class(name),
                Err(GateError::InvalidName { .. })
            ));
        }
    }

    #[test]
    fn test_records_and_replay() {
        let gate = gate_with(
            "accessible field net/game/Player health I",
            Arc::new(InMemoryDefiner::new()),
        );
        gate.load_class("net/game/World").expect("load");
        gate.load_class("net/game/Player").expect("load");

        let records = gate.records();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["net/game/Player", "net/game/World"]);
        assert!(records[0].transformed);
        assert!(!records[1].transformed);

        let report = gate.replay("net/game/Player").expect("replay");
        assert!(report.matches());
        assert!(gate.replay("net/game/Unloaded").is_err());
    }
}
