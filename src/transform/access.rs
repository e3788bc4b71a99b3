//! Access widening
//!
//! Mods ship access widener files that open up closed game classes:
//!
//! ```text
//! accessWidener v2 named
//! # comment
//! accessible class net/game/Player
//! accessible method net/game/Player damage (F)V
//! extendable class net/game/World
//! mutable field net/game/World seed J
//! ```
//!
//! | rule       | class                      | method                        | field        |
//! |------------|----------------------------|-------------------------------|--------------|
//! | accessible | public                     | public (+final if private)    | public       |
//! | extendable | public, not final          | protected at least, not final | invalid      |
//! | mutable    | invalid                    | invalid                       | not final    |
//!
//! A member rule whose field or method does not exist in the target class
//! aborts the class with [`TransformError::MissingTarget`].

use std::collections::BTreeMap;
use std::fmt;

use super::TransformUnit;
use super::class::{Access, ClassImage};
use crate::error::TransformError;
use crate::error::transform::missing_target;

pub const UNIT_NAME: &str = "access-widener";
pub const ORDER: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Accessible,
    Extendable,
    Mutable,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessKind::Accessible => "accessible",
            AccessKind::Extendable => "extendable",
            AccessKind::Mutable => "mutable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTarget {
    Class {
        name: String,
    },
    Method {
        owner: String,
        name: String,
        descriptor: String,
    },
    Field {
        owner: String,
        name: String,
        descriptor: String,
    },
}

impl fmt::Display for AccessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessTarget::Class { name } => write!(f, "class {name}"),
            AccessTarget::Method {
                name, descriptor, ..
            } => write!(f, "method {name}{descriptor}"),
            AccessTarget::Field {
                name, descriptor, ..
            } => write!(f, "field {name} {descriptor}"),
        }
    }
}

/// One access widening rule and the mod that declared it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub mod_id: String,
    pub kind: AccessKind,
    pub target: AccessTarget,
}

impl AccessRule {
    /// Class the rule applies to
    pub fn owner(&self) -> &str {
        match &self.target {
            AccessTarget::Class { name } => name,
            AccessTarget::Method { owner, .. } | AccessTarget::Field { owner, .. } => owner,
        }
    }
}

/// A parsed access widener file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessWidenerFile {
    pub namespace: String,
    pub rules: Vec<AccessRule>,
}

/// Parses an access widener file
///
/// # Errors
///
/// Returns a reason naming the line for a bad header or rule.
pub fn parse_access_widener(mod_id: &str, text: &str) -> Result<AccessWidenerFile, String> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, strip_comment(line)))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| "empty access widener file".to_string())?;
    let header: Vec<&str> = header.split_whitespace().collect();
    let namespace = match header.as_slice() {
        ["accessWidener", "v1" | "v2", namespace] => (*namespace).to_string(),
        ["accessWidener", version, _] => {
            return Err(format!("unsupported access widener version '{version}'"));
        }
        _ => return Err("expected header 'accessWidener <version> <namespace>'".to_string()),
    };

    let mut rules = Vec::new();
    for (number, line) in lines {
        let rule = parse_rule_line(mod_id, line)
            .map_err(|reason| format!("line {number}: {reason}"))?;
        rules.extend(rule);
    }
    Ok(AccessWidenerFile { namespace, rules })
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

/// Parses one rule line; blank and comment-only lines yield `None`
///
/// # Errors
///
/// Returns a reason for unknown keywords, wrong arity and rule/target
/// combinations that have no meaning.
pub fn parse_rule_line(mod_id: &str, line: &str) -> Result<Option<AccessRule>, String> {
    let line = strip_comment(line);
    if line.is_empty() {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();

    let keyword = parts[0].strip_prefix("transitive-").unwrap_or(parts[0]);
    let kind = match keyword {
        "accessible" => AccessKind::Accessible,
        "extendable" => AccessKind::Extendable,
        "mutable" => AccessKind::Mutable,
        other => return Err(format!("unknown access keyword '{other}'")),
    };

    let target = match parts.get(1..) {
        Some(["class", name]) => AccessTarget::Class {
            name: (*name).to_string(),
        },
        Some(["method", owner, name, descriptor]) => AccessTarget::Method {
            owner: (*owner).to_string(),
            name: (*name).to_string(),
            descriptor: (*descriptor).to_string(),
        },
        Some(["field", owner, name, descriptor]) => AccessTarget::Field {
            owner: (*owner).to_string(),
            name: (*name).to_string(),
            descriptor: (*descriptor).to_string(),
        },
        _ => return Err(format!("malformed rule '{line}'")),
    };

    match (kind, &target) {
        (AccessKind::Mutable, AccessTarget::Class { .. } | AccessTarget::Method { .. }) => {
            return Err(format!("'mutable' only applies to fields: '{line}'"));
        }
        (AccessKind::Extendable, AccessTarget::Field { .. }) => {
            return Err(format!("'extendable' does not apply to fields: '{line}'"));
        }
        _ => {}
    }

    Ok(Some(AccessRule {
        mod_id: mod_id.to_string(),
        kind,
        target,
    }))
}

/// Applies the access rules of every loaded mod
#[derive(Debug, Default)]
pub struct AccessWidenerUnit {
    rules: BTreeMap<String, Vec<AccessRule>>,
}

impl AccessWidenerUnit {
    pub fn new(rules: impl IntoIterator<Item = AccessRule>) -> Self {
        let mut by_owner: BTreeMap<String, Vec<AccessRule>> = BTreeMap::new();
        for rule in rules {
            by_owner.entry(rule.owner().to_string()).or_default().push(rule);
        }
        Self { rules: by_owner }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn widen_class(access: Access, kind: AccessKind) -> Access {
    match kind {
        AccessKind::Accessible => access.with_visibility(Access::PUBLIC),
        AccessKind::Extendable => access.with_visibility(Access::PUBLIC) - Access::FINAL,
        AccessKind::Mutable => access,
    }
}

fn widen_method(access: Access, kind: AccessKind) -> Access {
    match kind {
        AccessKind::Accessible => {
            let mut widened = access.with_visibility(Access::PUBLIC);
            // Private instance methods are not virtual; keep them unoverridable
            if access.contains(Access::PRIVATE) && !access.contains(Access::STATIC) {
                widened |= Access::FINAL;
            }
            widened
        }
        AccessKind::Extendable => {
            let visibility = if access.contains(Access::PUBLIC) {
                Access::PUBLIC
            } else {
                Access::PROTECTED
            };
            access.with_visibility(visibility) - Access::FINAL
        }
        AccessKind::Mutable => access,
    }
}

fn widen_field(access: Access, kind: AccessKind) -> Access {
    match kind {
        AccessKind::Accessible => access.with_visibility(Access::PUBLIC),
        AccessKind::Mutable => access - Access::FINAL,
        AccessKind::Extendable => access,
    }
}

impl TransformUnit for AccessWidenerUnit {
    fn name(&self) -> &str {
        UNIT_NAME
    }

    fn order(&self) -> u32 {
        ORDER
    }

    fn applies_to(&self, class: &ClassImage) -> bool {
        self.rules.contains_key(&class.name)
    }

    fn apply(&self, class: &mut ClassImage) -> Result<(), TransformError> {
        let Some(rules) = self.rules.get(&class.name) else {
            return Ok(());
        };

        for rule in rules {
            match &rule.target {
                AccessTarget::Class { .. } => {
                    class.access = widen_class(class.access, rule.kind);
                }
                AccessTarget::Method {
                    name, descriptor, ..
                } => {
                    let class_name = class.name.clone();
                    let method = class.method_mut(name, descriptor).ok_or_else(|| {
                        missing_target(
                            UNIT_NAME,
                            &class_name,
                            &rule.mod_id,
                            rule.target.to_string(),
                        )
                    })?;
                    method.access = widen_method(method.access, rule.kind);
                }
                AccessTarget::Field {
                    name, descriptor, ..
                } => {
                    let class_name = class.name.clone();
                    let field = class.field_mut(name, descriptor).ok_or_else(|| {
                        missing_target(
                            UNIT_NAME,
                            &class_name,
                            &rule.mod_id,
                            rule.target.to_string(),
                        )
                    })?;
                    field.access = widen_field(field.access, rule.kind);
                }
            }
        }
        Ok(())
    }
}
