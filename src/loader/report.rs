//! Boot summaries and the mod list printed at startup

use std::fmt::Write as _;
use std::sync::Arc;

use crate::metadata::{ModMetadata, ModOrigin};

use super::LoaderPhase;

/// What one `Loader::boot` call got through
#[derive(Debug, Clone, Default)]
pub struct BootReport {
    pub phase: LoaderPhase,
    /// Candidates the scanner produced, duplicates included
    pub discovered: usize,
    /// Packages skipped during discovery
    pub skipped: usize,
    /// Resolved mods in dependency order, empty on a dry run
    pub mods: Vec<Arc<ModMetadata>>,
    pub entrypoints_run: usize,
    pub classes_defined: usize,
    pub libraries_verified: usize,
}

impl BootReport {
    pub fn is_dry_run(&self) -> bool {
        self.phase == LoaderPhase::Scanning
    }
}

/// Formats resolved mods as an indented list, one mod per line
///
/// Builtin mods are listed without an origin; nested lines use a tree glyph.
pub fn format_mod_list(mods: &[Arc<ModMetadata>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Loading {} mod{}:", mods.len(), if mods.len() == 1 { "" } else { "s" });
    for (index, meta) in mods.iter().enumerate() {
        let glyph = if index + 1 == mods.len() { "\\--" } else { "|--" };
        match &meta.origin {
            ModOrigin::Builtin => {
                let _ = writeln!(out, "\t{glyph} {} {}", meta.id, meta.version);
            }
            origin => {
                let _ = writeln!(out, "\t{glyph} {} {} ({origin})", meta.id, meta.version);
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::metadata::Version;

    #[test]
    fn test_mod_list() {
        let mods = vec![
            Arc::new(ModMetadata::builtin("game", Version::new([41, 78]), "Game")),
            Arc::new(ModMetadata::builtin("leafloader", Version::new([0, 3, 0]), "Leaf")),
        ];
        let text = format_mod_list(&mods);
        assert_eq!(
            text,
            "Loading 2 mods:\n\t|-- game 41.78\n\t\\-- leafloader 0.3.0\n"
        );
    }

    #[test]
    fn test_empty_mod_list() {
        assert_eq!(format_mod_list(&[]), "Loading 0 mods:\n");
    }
}
