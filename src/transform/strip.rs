//! Environment stripping
//!
//! Classes and members can be marked as existing on one side only. When the
//! game runs as the other side, marked members are removed and a marked class
//! cannot be loaded at all.

use super::TransformUnit;
use super::class::ClassImage;
use crate::error::TransformError;
use crate::metadata::Side;

pub const UNIT_NAME: &str = "environment-strip";
pub const ORDER: u32 = 200;

#[derive(Debug, Clone, Copy)]
pub struct EnvironmentStripUnit {
    side: Side,
}

impl EnvironmentStripUnit {
    pub fn new(side: Side) -> Self {
        Self { side }
    }

    fn foreign(&self, environment: Option<Side>) -> bool {
        environment.is_some_and(|side| side != self.side)
    }
}

impl TransformUnit for EnvironmentStripUnit {
    fn name(&self) -> &str {
        UNIT_NAME
    }

    fn order(&self) -> u32 {
        ORDER
    }

    fn applies_to(&self, class: &ClassImage) -> bool {
        self.foreign(class.environment)
            || class.fields.iter().any(|f| self.foreign(f.environment))
            || class.methods.iter().any(|m| self.foreign(m.environment))
    }

    fn apply(&self, class: &mut ClassImage) -> Result<(), TransformError> {
        if self.foreign(class.environment) {
            return Err(TransformError::WrongEnvironment {
                unit: UNIT_NAME.to_string(),
                class: class.name.clone(),
                side: self.side.to_string(),
            });
        }
        let side = self.side;
        class
            .fields
            .retain(|f| f.environment.is_none_or(|s| s == side));
        class
            .methods
            .retain(|m| m.environment.is_none_or(|s| s == side));
        Ok(())
    }
}
