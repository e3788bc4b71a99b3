//! Name remapping
//!
//! Game classes ship under one naming namespace (usually obfuscated) while
//! the runtime expects another. Mappings are read from tiny v2 files:
//!
//! ```text
//! tiny	2	0	official	named
//! c	a	net/game/Player
//! 	f	I	b	health
//! 	m	(F)V	c	damage
//! 		p	1		amount
//! ```
//!
//! Member descriptors in the file are written in the first namespace.
//! Remapping runs last so the other units see source names.

use std::collections::BTreeMap;

use super::TransformUnit;
use super::class::ClassImage;
use crate::error::TransformError;

pub const UNIT_NAME: &str = "remap";
pub const ORDER: u32 = 400;

type MemberKey = (String, String, String);

/// Class and member names from one namespace to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    from: String,
    to: String,
    classes: BTreeMap<String, String>,
    reverse_classes: BTreeMap<String, String>,
    fields: BTreeMap<MemberKey, String>,
    methods: BTreeMap<MemberKey, String>,
}

struct MemberRow {
    owner: usize,
    descriptor: String,
    names: Vec<String>,
}

impl Mappings {
    /// Parses a tiny v2 file, mapping namespace `from` to namespace `to`
    ///
    /// # Errors
    ///
    /// Returns a reason for a bad header, unknown namespaces or rows with
    /// the wrong number of columns.
    pub fn parse_tiny_v2(text: &str, from: &str, to: &str) -> Result<Mappings, String> {
        let mut lines = text.lines().enumerate();
        let (_, header) = lines.next().ok_or_else(|| "empty mappings file".to_string())?;
        let header: Vec<&str> = header.split('\t').collect();
        if header.len() < 5 || header[0] != "tiny" || header[1] != "2" {
            return Err("expected header 'tiny\\t2\\t<minor>\\t<namespaces...>'".to_string());
        }
        let namespaces = &header[3..];
        let column = |ns: &str| {
            namespaces
                .iter()
                .position(|n| *n == ns)
                .ok_or_else(|| {
                    format!("namespace '{ns}' not in mappings ({})", namespaces.join(", "))
                })
        };
        let (from_col, to_col) = (column(from)?, column(to)?);
        let width = namespaces.len();

        let mut class_rows: Vec<Vec<String>> = Vec::new();
        let mut field_rows: Vec<MemberRow> = Vec::new();
        let mut method_rows: Vec<MemberRow> = Vec::new();

        for (index, line) in lines {
            let number = index + 1;
            if line.trim().is_empty() {
                continue;
            }
            let cols: Vec<&str> = line.split('\t').collect();
            let bad_row = || format!("line {number}: malformed row");
            match cols.as_slice() {
                ["c", names @ ..] => {
                    if names.len() != width {
                        return Err(bad_row());
                    }
                    class_rows.push(names.iter().map(|s| (*s).to_string()).collect());
                }
                ["", kind @ ("f" | "m"), descriptor, names @ ..] => {
                    let owner = class_rows.len().checked_sub(1).ok_or_else(|| {
                        format!("line {number}: member outside of a class")
                    })?;
                    if names.len() != width {
                        return Err(bad_row());
                    }
                    let row = MemberRow {
                        owner,
                        descriptor: (*descriptor).to_string(),
                        names: names.iter().map(|s| (*s).to_string()).collect(),
                    };
                    if *kind == "f" {
                        field_rows.push(row);
                    } else {
                        method_rows.push(row);
                    }
                }
                // Parameters, locals and comments do not affect names we remap
                ["", "c", ..] | ["", "", ..] => {}
                _ => return Err(bad_row()),
            }
        }

        let pick = |names: &[String], col: usize| -> String {
            let name = &names[col];
            if name.is_empty() {
                names[0].clone()
            } else {
                name.clone()
            }
        };

        let mut first_to_from = BTreeMap::new();
        let mut mappings = Mappings {
            from: from.to_string(),
            to: to.to_string(),
            ..Mappings::default()
        };
        for names in &class_rows {
            let source = pick(names, from_col);
            let target = pick(names, to_col);
            first_to_from.insert(names[0].clone(), source.clone());
            mappings.reverse_classes.insert(target.clone(), source.clone());
            mappings.classes.insert(source, target);
        }

        for (rows, table) in [
            (&field_rows, &mut mappings.fields),
            (&method_rows, &mut mappings.methods),
        ] {
            for row in rows {
                let owner = pick(&class_rows[row.owner], from_col);
                let descriptor = remap_descriptor(&row.descriptor, &first_to_from);
                table.insert(
                    (owner, pick(&row.names, from_col), descriptor),
                    pick(&row.names, to_col),
                );
            }
        }

        Ok(mappings)
    }

    pub fn from_namespace(&self) -> &str {
        &self.from
    }

    pub fn to_namespace(&self) -> &str {
        &self.to
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }

    /// Runtime name of a source class; unmapped names stay as they are
    pub fn map_class<'a>(&'a self, source: &'a str) -> &'a str {
        self.classes.get(source).map_or(source, String::as_str)
    }

    /// Source name of a runtime class; unmapped names stay as they are
    pub fn unmap_class<'a>(&'a self, runtime: &'a str) -> &'a str {
        self.reverse_classes.get(runtime).map_or(runtime, String::as_str)
    }

    pub fn map_descriptor(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, &self.classes)
    }

    fn map_member(
        table: &BTreeMap<MemberKey, String>,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<String> {
        table
            .get(&(owner.to_string(), name.to_string(), descriptor.to_string()))
            .cloned()
    }
}

/// Rewrites every `L<class>;` reference in a descriptor
fn remap_descriptor(descriptor: &str, classes: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;
    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..=start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                let name = &after[..end];
                out.push_str(classes.get(name).map_or(name, String::as_str));
                out.push(';');
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(after);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renames a class and its members into the runtime namespace
#[derive(Debug)]
pub struct RemapUnit {
    mappings: std::sync::Arc<Mappings>,
}

impl RemapUnit {
    pub fn new(mappings: std::sync::Arc<Mappings>) -> Self {
        Self { mappings }
    }
}

impl TransformUnit for RemapUnit {
    fn name(&self) -> &str {
        UNIT_NAME
    }

    fn order(&self) -> u32 {
        ORDER
    }

    fn applies_to(&self, _class: &ClassImage) -> bool {
        !self.mappings.is_empty()
    }

    fn apply(&self, class: &mut ClassImage) -> Result<(), TransformError> {
        let m = &self.mappings;
        let owner = class.name.clone();

        for field in &mut class.fields {
            if let Some(name) =
                Mappings::map_member(&m.fields, &owner, &field.name, &field.descriptor)
            {
                field.name = name;
            }
            field.descriptor = m.map_descriptor(&field.descriptor);
        }
        for method in &mut class.methods {
            if let Some(name) =
                Mappings::map_member(&m.methods, &owner, &method.name, &method.descriptor)
            {
                method.name = name;
            }
            method.descriptor = m.map_descriptor(&method.descriptor);
        }

        class.name = m.map_class(&owner).to_string();
        if let Some(super_name) = &class.super_name {
            class.super_name = Some(m.map_class(super_name).to_string());
        }
        for interface in &mut class.interfaces {
            *interface = m.map_class(interface).to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::transform::class::{Access, FieldInfo, MethodInfo};

    const TINY: &str = "tiny\t2\t0\tofficial\tnamed\n\
c\ta\tnet/game/Player\n\
\tf\tI\tb\thealth\n\
\tm\t(La;F)V\tc\tdamage\n\
\t\tp\t1\t\tamount\n\
c\td\tnet/game/Entity\n";

    fn mappings() -> Mappings {
        Mappings::parse_tiny_v2(TINY, "official", "named").expect("valid mappings")
    }

    #[test]
    fn test_parse_and_lookup() {
        let m = mappings();
        assert_eq!(m.map_class("a"), "net/game/Player");
        assert_eq!(m.unmap_class("net/game/Player"), "a");
        assert_eq!(m.map_class("zzz"), "zzz");
        assert_eq!(m.map_descriptor("(La;[Ld;I)La;"), "(Lnet/game/Player;[Lnet/game/Entity;I)Lnet/game/Player;");
    }

    #[test]
    fn test_reverse_direction() {
        let m = Mappings::parse_tiny_v2(TINY, "named", "official").expect("valid mappings");
        assert_eq!(m.map_class("net/game/Player"), "a");
        assert_eq!(
            Mappings::map_member(&m.methods, "net/game/Player", "damage", "(Lnet/game/Player;F)V"),
            Some("c".to_string())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Mappings::parse_tiny_v2("", "a", "b").is_err());
        assert!(Mappings::parse_tiny_v2("tiny\t1\t0\ta\tb\n", "a", "b").is_err());
        assert!(Mappings::parse_tiny_v2(TINY, "official", "intermediary").is_err());
        assert!(Mappings::parse_tiny_v2("tiny\t2\t0\ta\tb\n\tf\tI\tx\ty\n", "a", "b").is_err());
    }

    #[test]
    fn test_remap_class() {
        let mut image = ClassImage::new("a");
        image.super_name = Some("d".to_string());
        image.fields.push(FieldInfo {
            name: "b".to_string(),
            descriptor: "I".to_string(),
            access: Access::PRIVATE,
            environment: None,
        });
        image.methods.push(MethodInfo {
            name: "c".to_string(),
            descriptor: "(La;F)V".to_string(),
            access: Access::PUBLIC,
            environment: None,
            code: Vec::new(),
        });

        let unit = RemapUnit::new(Arc::new(mappings()));
        unit.apply(&mut image).expect("remap succeeds");

        assert_eq!(image.name, "net/game/Player");
        assert_eq!(image.super_name.as_deref(), Some("net/game/Entity"));
        assert_eq!(image.fields[0].name, "health");
        assert_eq!(image.methods[0].name, "damage");
        assert_eq!(image.methods[0].descriptor, "(Lnet/game/Player;F)V");
    }
}
