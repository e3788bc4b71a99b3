//! Class transform pipeline
//!
//! The pipeline turns the bytes of a game class into the bytes the host
//! defines. It is built once from the resolved mod set and is immutable
//! afterwards, so one instance is shared by every loading thread.
//!
//! ## Units
//!
//! | order | unit                | does                                   |
//! |-------|---------------------|----------------------------------------|
//! | 100   | `access-widener`    | widens class and member access         |
//! | 200   | `environment-strip` | removes members of the other side      |
//! | 300   | `mixin`             | injects, overwrites and adds members   |
//! | 400   | `remap`             | renames into the runtime namespace     |
//!
//! A class is decoded once, passed through every unit that targets it and
//! encoded again. A class no unit changes comes back byte-for-byte.

pub mod access;
pub mod class;
pub mod mixin;
pub mod remap;
pub mod strip;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::TransformError;
use crate::metadata::{ModMetadata, Side};
use class::ClassImage;
use remap::Mappings;

/// One step of the pipeline
///
/// Units are pure functions of the class image and the mod set they were
/// built from. They never keep state between classes.
pub trait TransformUnit: Send + Sync + fmt::Debug {
    /// Stable unit name used in diagnostics
    fn name(&self) -> &str;

    /// Ordering key; lower runs first
    fn order(&self) -> u32;

    /// Whether the unit has anything to do for this class
    fn applies_to(&self, class: &ClassImage) -> bool;

    /// Transforms the class in place
    ///
    /// # Errors
    ///
    /// Any error aborts the whole class; the caller discards the image.
    fn apply(&self, class: &mut ClassImage) -> Result<(), TransformError>;
}

/// Inputs the standard units are built from
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub side: Side,
    pub mappings: Option<Arc<Mappings>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            side: Side::Client,
            mappings: None,
        }
    }
}

/// Ordered, immutable list of transform units
#[derive(Debug, Default)]
pub struct Pipeline {
    units: Vec<Box<dyn TransformUnit>>,
}

impl Pipeline {
    /// Builds a pipeline from explicit units, sorted by their order key
    pub fn new(mut units: Vec<Box<dyn TransformUnit>>) -> Self {
        units.sort_by_key(|u| u.order());
        Self { units }
    }

    /// Builds the standard units for a resolved mod set
    ///
    /// Mods are read in the given order; unit ordering inside the access
    /// widener and mixin units does not depend on it.
    pub fn for_mods(mods: &[Arc<ModMetadata>], options: &PipelineOptions) -> Self {
        let access_rules = mods.iter().flat_map(|m| m.access_rules.iter().cloned());
        let patches = mods.iter().flat_map(|m| m.mixins.iter().cloned());

        let mut units: Vec<Box<dyn TransformUnit>> = vec![
            Box::new(access::AccessWidenerUnit::new(access_rules)),
            Box::new(strip::EnvironmentStripUnit::new(options.side)),
            Box::new(mixin::MixinUnit::new(patches)),
        ];
        if let Some(mappings) = &options.mappings {
            units.push(Box::new(remap::RemapUnit::new(Arc::clone(mappings))));
        }

        let pipeline = Self::new(units);
        debug!(
            target: "leaf::transform",
            units = ?pipeline.unit_names(),
            "Class pipeline built"
        );
        pipeline
    }

    /// Unit names in execution order
    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name()).collect()
    }

    /// Transforms the bytes of one class
    ///
    /// # Arguments
    ///
    /// * `class_name` - Source-namespace name the bytes were read under
    /// * `bytes` - Encoded class image
    ///
    /// # Errors
    ///
    /// Returns the first unit failure, or [`TransformError::Malformed`] when
    /// the bytes are not a class image for `class_name`. No partial result
    /// is ever returned.
    pub fn transform(&self, class_name: &str, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        if self.units.is_empty() {
            return Ok(bytes.to_vec());
        }

        let original = ClassImage::decode(class_name, bytes)?;
        if original.name != class_name {
            return Err(TransformError::Malformed {
                class: class_name.to_string(),
                reason: format!("image declares class '{}'", original.name),
            });
        }

        let mut image = original.clone();
        let mut touched = false;
        for unit in &self.units {
            if !unit.applies_to(&image) {
                continue;
            }
            trace!(
                target: "leaf::transform",
                class = class_name,
                unit = unit.name(),
                "Applying unit"
            );
            unit.apply(&mut image)?;
            touched = true;
        }

        if !touched || image == original {
            return Ok(bytes.to_vec());
        }
        image.encode()
    }
}
