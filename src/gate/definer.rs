//! Handing transformed bytes to the host

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Defines classes in the host runtime
///
/// Called at most once per class name by the gate.
pub trait ClassDefiner: Send + Sync + fmt::Debug {
    /// Defines `bytes` under `class_name` and returns the host's definition id
    ///
    /// # Errors
    ///
    /// Returns the host's reason when it refuses the class.
    fn define(&self, class_name: &str, bytes: &[u8]) -> Result<u64, String>;
}

/// Records definitions in memory and hands out ids 1, 2, 3, ...
#[derive(Debug, Default)]
pub struct InMemoryDefiner {
    next_id: AtomicU64,
    defined: Mutex<BTreeMap<String, u64>>,
}

impl InMemoryDefiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes defined so far
    pub fn defined_count(&self) -> usize {
        self.defined.lock().len()
    }

    pub fn definition_id(&self, class_name: &str) -> Option<u64> {
        self.defined.lock().get(class_name).copied()
    }
}

impl ClassDefiner for InMemoryDefiner {
    fn define(&self, class_name: &str, _bytes: &[u8]) -> Result<u64, String> {
        let mut defined = self.defined.lock();
        if defined.contains_key(class_name) {
            return Err(format!("'{class_name}' is already defined"));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        defined.insert(class_name.to_string(), id);
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let definer = InMemoryDefiner::new();
        assert_eq!(definer.define("a/A", b"").expect("define"), 1);
        assert_eq!(definer.define("a/B", b"").expect("define"), 2);
        assert_eq!(definer.definition_id("a/A"), Some(1));
        assert_eq!(definer.defined_count(), 2);
    }

    #[test]
    fn test_redefinition_is_refused() {
        let definer = InMemoryDefiner::new();
        definer.define("a/A", b"").expect("define");
        assert!(definer.define("a/A", b"").is_err());
    }
}
