//! Mixin patches
//!
//! Mods describe structural changes to game classes in JSON patch configs:
//!
//! ```json
//! {
//!   "priority": 1000,
//!   "patches": [
//!     { "target": "net/game/Player", "kind": "inject", "method": "tick",
//!       "descriptor": "()V", "at": "head", "code": ["invokestatic example/Hooks.onTick()V"] },
//!     { "target": "net/game/Player", "kind": "addField", "name": "mana",
//!       "descriptor": "I", "access": ["private"] },
//!     { "target": "net/game/Player", "kind": "addInterface", "interface": "example/Caster" }
//!   ]
//! }
//! ```
//!
//! Patches for one class apply in ascending priority, then by mod id, then
//! in declaration order. A patch whose target method is missing, a member
//! added twice, or a method overwritten by two patches aborts the class.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use super::TransformUnit;
use super::class::{Access, ClassImage, FieldInfo, MethodInfo};
use crate::error::TransformError;
use crate::error::transform::{missing_target, structural};

pub const UNIT_NAME: &str = "mixin";
pub const ORDER: u32 = 300;

/// Priority of configs that do not declare one
pub const DEFAULT_PRIORITY: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectPoint {
    Head,
    Tail,
}

/// One validated structural change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchAction {
    Inject {
        method: String,
        descriptor: String,
        at: InjectPoint,
        code: Vec<String>,
    },
    Overwrite {
        method: String,
        descriptor: String,
        code: Vec<String>,
    },
    AddMethod {
        name: String,
        descriptor: String,
        access: Access,
        code: Vec<String>,
    },
    AddField {
        name: String,
        descriptor: String,
        access: Access,
    },
    AddInterface {
        interface: String,
    },
}

/// A patch together with its ordering data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinPatch {
    pub mod_id: String,
    pub priority: i32,
    /// Declaration index across all configs of the mod
    pub order: usize,
    pub target: String,
    pub action: PatchAction,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_priority")]
    priority: i32,
    #[serde(default)]
    patches: Vec<RawPatch>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Deserialize)]
struct RawPatch {
    target: String,
    #[serde(flatten)]
    action: RawAction,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum RawAction {
    Inject {
        method: String,
        descriptor: String,
        at: InjectPoint,
        #[serde(default)]
        code: Vec<String>,
    },
    Overwrite {
        method: String,
        descriptor: String,
        #[serde(default)]
        code: Vec<String>,
    },
    AddMethod {
        name: String,
        descriptor: String,
        #[serde(default)]
        access: Option<Vec<String>>,
        #[serde(default)]
        code: Vec<String>,
    },
    AddField {
        name: String,
        descriptor: String,
        #[serde(default)]
        access: Option<Vec<String>>,
    },
    AddInterface {
        interface: String,
    },
}

fn member_access(names: Option<Vec<String>>) -> Result<Access, String> {
    match names {
        None => Ok(Access::PUBLIC),
        Some(names) => Access::from_names(&names),
    }
}

/// Parses one patch config of `mod_id`
///
/// `first_order` is the number of patches the mod declared in earlier
/// configs, so declaration order stays global per mod.
///
/// # Errors
///
/// Returns a reason for invalid JSON, unknown patch kinds or flags.
pub fn parse_mixin_config(
    mod_id: &str,
    text: &str,
    first_order: usize,
) -> Result<Vec<MixinPatch>, String> {
    let config: RawConfig = serde_json::from_str(text).map_err(|e| e.to_string())?;

    config
        .patches
        .into_iter()
        .enumerate()
        .map(|(index, patch)| -> Result<MixinPatch, String> {
            let action = match patch.action {
                RawAction::Inject {
                    method,
                    descriptor,
                    at,
                    code,
                } => PatchAction::Inject {
                    method,
                    descriptor,
                    at,
                    code,
                },
                RawAction::Overwrite {
                    method,
                    descriptor,
                    code,
                } => PatchAction::Overwrite {
                    method,
                    descriptor,
                    code,
                },
                RawAction::AddMethod {
                    name,
                    descriptor,
                    access,
                    code,
                } => PatchAction::AddMethod {
                    name,
                    descriptor,
                    access: member_access(access)?,
                    code,
                },
                RawAction::AddField {
                    name,
                    descriptor,
                    access,
                } => PatchAction::AddField {
                    name,
                    descriptor,
                    access: member_access(access)?,
                },
                RawAction::AddInterface { interface } => PatchAction::AddInterface { interface },
            };
            Ok(MixinPatch {
                mod_id: mod_id.to_string(),
                priority: config.priority,
                order: first_order + index,
                target: patch.target,
                action,
            })
        })
        .collect()
}

/// Applies mixin patches of every loaded mod
#[derive(Debug, Default)]
pub struct MixinUnit {
    patches: BTreeMap<String, Vec<MixinPatch>>,
}

impl MixinUnit {
    pub fn new(patches: impl IntoIterator<Item = MixinPatch>) -> Self {
        let mut by_target: BTreeMap<String, Vec<MixinPatch>> = BTreeMap::new();
        for patch in patches {
            by_target.entry(patch.target.clone()).or_default().push(patch);
        }
        for list in by_target.values_mut() {
            list.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.mod_id.cmp(&b.mod_id))
                    .then_with(|| a.order.cmp(&b.order))
            });
        }
        Self { patches: by_target }
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Patches for one class in application order
    pub fn patches_for(&self, class: &str) -> &[MixinPatch] {
        self.patches.get(class).map_or(&[][..], Vec::as_slice)
    }
}

impl TransformUnit for MixinUnit {
    fn name(&self) -> &str {
        UNIT_NAME
    }

    fn order(&self) -> u32 {
        ORDER
    }

    fn applies_to(&self, class: &ClassImage) -> bool {
        self.patches.contains_key(&class.name)
    }

    fn apply(&self, class: &mut ClassImage) -> Result<(), TransformError> {
        let mut overwritten: HashMap<(String, String), &str> = HashMap::new();

        for patch in self.patches_for(&class.name) {
            let class_name = class.name.clone();
            let mod_id = patch.mod_id.as_str();

            match &patch.action {
                PatchAction::Inject {
                    method,
                    descriptor,
                    at,
                    code,
                } => {
                    let target = class.method_mut(method, descriptor).ok_or_else(|| {
                        missing_target(
                            UNIT_NAME,
                            &class_name,
                            mod_id,
                            format!("method {method}{descriptor}"),
                        )
                    })?;
                    match at {
                        InjectPoint::Head => {
                            target.code.splice(0..0, code.iter().cloned());
                        }
                        InjectPoint::Tail => target.code.extend(code.iter().cloned()),
                    }
                }
                PatchAction::Overwrite {
                    method,
                    descriptor,
                    code,
                } => {
                    let key = (method.clone(), descriptor.clone());
                    if let Some(previous) = overwritten.get(&key) {
                        return Err(structural(
                            UNIT_NAME,
                            &class_name,
                            mod_id,
                            format!(
                                "method {method}{descriptor} is already overwritten by mod \
                                 '{previous}'"
                            ),
                        ));
                    }
                    let target = class.method_mut(method, descriptor).ok_or_else(|| {
                        missing_target(
                            UNIT_NAME,
                            &class_name,
                            mod_id,
                            format!("method {method}{descriptor}"),
                        )
                    })?;
                    target.code.clone_from(code);
                    overwritten.insert(key, mod_id);
                }
                PatchAction::AddMethod {
                    name,
                    descriptor,
                    access,
                    code,
                } => {
                    if class.method(name, descriptor).is_some() {
                        return Err(structural(
                            UNIT_NAME,
                            &class_name,
                            mod_id,
                            format!("duplicate method {name}{descriptor}"),
                        ));
                    }
                    class.methods.push(MethodInfo {
                        name: name.clone(),
                        descriptor: descriptor.clone(),
                        access: *access,
                        environment: None,
                        code: code.clone(),
                    });
                }
                PatchAction::AddField {
                    name,
                    descriptor,
                    access,
                } => {
                    if class.field(name, descriptor).is_some() {
                        return Err(structural(
                            UNIT_NAME,
                            &class_name,
                            mod_id,
                            format!("duplicate field {name} {descriptor}"),
                        ));
                    }
                    class.fields.push(FieldInfo {
                        name: name.clone(),
                        descriptor: descriptor.clone(),
                        access: *access,
                        environment: None,
                    });
                }
                PatchAction::AddInterface { interface } => {
                    if !class.interfaces.contains(interface) {
                        class.interfaces.push(interface.clone());
                    }
                }
            }
        }
        Ok(())
    }
}
