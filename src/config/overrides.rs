//! Comma separated override lists from flags and environment variables

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConfigError;
use crate::error::config::invalid;
use crate::metadata::Version;

/// Parses `modA:1.0.0,modB:2.1` into id → version
///
/// Blank entries are skipped; a later entry for the same id wins.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for an entry without `:` or with a
/// malformed version.
pub fn parse_version_overrides(text: &str) -> Result<BTreeMap<String, Version>, ConfigError> {
    let mut overrides = BTreeMap::new();
    for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (id, version) = entry
            .split_once(':')
            .ok_or_else(|| invalid(format!("version override '{entry}' is not id:version")))?;
        let version = Version::parse(version.trim())
            .map_err(|e| invalid(format!("version override '{entry}': {e}")))?;
        overrides.insert(id.trim().to_string(), version);
    }
    Ok(overrides)
}

/// Parses `a,b , c` into a set of ids
pub fn parse_id_list(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
