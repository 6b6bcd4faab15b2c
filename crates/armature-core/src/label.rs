//! Build labels of the form `//package/path:name`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A build label. The package path supplies the originating path
/// segments used for target disambiguation; the name supplies the base
/// target name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label {
    package: String,
    name: String,
}

impl Label {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let rest = raw
            .strip_prefix("//")
            .ok_or_else(|| ModelError::InvalidLabel(raw.to_string()))?;
        let (package, name) = rest
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidLabel(raw.to_string()))?;
        if name.is_empty() || package.starts_with('/') || package.ends_with('/') {
            return Err(ModelError::InvalidLabel(raw.to_string()));
        }
        Ok(Self {
            package: package.to_string(),
            name: name.to_string(),
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package path components, outermost first. Empty for the root
    /// package.
    pub fn package_segments(&self) -> Vec<&str> {
        if self.package.is_empty() {
            Vec::new()
        } else {
            self.package.split('/').collect()
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.package, self.name)
    }
}

impl TryFrom<String> for Label {
    type Error = ModelError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}
