//! Maven coordinates and the repository layout

use std::fmt;
use std::path::PathBuf;

use crate::error::IntegrityError;

/// `group:artifact:version[:classifier][@extension]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MavenCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl MavenCoordinate {
    /// Parses a coordinate string
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::InvalidCoordinate`] unless there are three or
    /// four non-empty parts.
    pub fn parse(text: &str) -> Result<Self, IntegrityError> {
        let err = || IntegrityError::InvalidCoordinate {
            artifact: text.to_string(),
        };
        let (coordinate, extension) = match text.split_once('@') {
            Some((coordinate, extension)) if !extension.is_empty() => (coordinate, extension),
            Some(_) => return Err(err()),
            None => (text, "jar"),
        };
        let parts: Vec<&str> = coordinate.split(':').collect();
        if !(3..=4).contains(&parts.len()) || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(err());
        }
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier: parts.get(3).map(|c| (*c).to_string()),
            extension: extension.to_string(),
        })
    }

    /// File name in the repository, e.g. `asm-9.7.jar`
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Path relative to a repository root
    ///
    /// `org.ow2.asm:asm:9.7` → `org/ow2/asm/asm/9.7/asm-9.7.jar`
    pub fn repository_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.artifact);
        path.push(&self.version);
        path.push(self.file_name());
        path
    }
}

impl fmt::Display for MavenCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
