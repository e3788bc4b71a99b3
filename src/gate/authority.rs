//! Which class names the gate transforms

use wax::{CandidatePath, Glob, Pattern};

use crate::error::ConfigError;
use crate::error::config::invalid;

/// Namespace of the loader's own classes; never transformed
pub const LOADER_NAMESPACE: &str = "dev/leaf/loader/**";

/// Include and exclude globs over `/`-separated class names
#[derive(Debug, Clone)]
pub struct Authority {
    include: Vec<Glob<'static>>,
    exclude: Vec<Glob<'static>>,
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Glob<'static>>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Glob::new(pattern.as_ref())
                .map(Glob::into_owned)
                .map_err(|e| invalid(format!("invalid class glob '{}': {e}", pattern.as_ref())))
        })
        .collect()
}

impl Authority {
    /// Builds an authority; an empty include list means every class
    ///
    /// The loader namespace is always excluded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a pattern that is not a glob.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ConfigError> {
        let mut include = compile(include)?;
        if include.is_empty() {
            include = compile(&["**"])?;
        }
        let mut exclude = compile(exclude)?;
        exclude.extend(compile(&[LOADER_NAMESPACE])?);
        Ok(Self { include, exclude })
    }

    /// Every class outside the loader namespace
    ///
    /// # Errors
    ///
    /// Never fails for the built-in patterns; the `Result` mirrors [`Authority::new`].
    pub fn everything() -> Result<Self, ConfigError> {
        Self::new::<&str>(&[], &[])
    }

    /// Whether the gate should serve this class
    pub fn covers(&self, class_name: &str) -> bool {
        let candidate = CandidatePath::from(class_name);
        self.include.iter().any(|g| g.matched(&candidate).is_some())
            && !self.exclude.iter().any(|g| g.matched(&candidate).is_some())
    }
}
