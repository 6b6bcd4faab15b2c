//! Classified file paths
//!
//! Every path referenced by the build graph carries a kind tag saying
//! which root it is relative to. The tag is part of the path's identity
//! and survives all the way to the project writer, which keys its
//! source-tree handling off it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Which root a path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Relative to the source checkout root.
    Project,
    /// Relative to the build system's generated-output root.
    Generated,
    /// Relative to the external-dependency root.
    External,
    /// Relative to the tool's own support directory.
    Internal,
}

/// A kind-tagged relative path.
///
/// Identity (equality, ordering, hashing) is defined over `(kind, path)`
/// only. The folder flag marks folder references in the file tree and is
/// display metadata, not identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePath {
    pub kind: PathKind,
    pub path: String,
    #[serde(default, rename = "folder")]
    pub is_folder: bool,
}

impl FilePath {
    pub fn new(kind: PathKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            is_folder: false,
        }
    }

    pub fn project(path: impl Into<String>) -> Self {
        Self::new(PathKind::Project, path)
    }

    pub fn generated(path: impl Into<String>) -> Self {
        Self::new(PathKind::Generated, path)
    }

    pub fn external(path: impl Into<String>) -> Self {
        Self::new(PathKind::External, path)
    }

    pub fn internal(path: impl Into<String>) -> Self {
        Self::new(PathKind::Internal, path)
    }

    /// Marks this path as a folder reference.
    pub fn folder(mut self) -> Self {
        self.is_folder = true;
        self
    }

    /// Classify a raw extractor path into one of the four kinds using
    /// prefix conventions. Absolute paths, empty paths, and paths that
    /// escape their root are a contract violation.
    pub fn classify(raw: &str, conventions: &PathConventions) -> Result<Self, ModelError> {
        if raw.is_empty() || raw.starts_with('/') {
            return Err(ModelError::UnclassifiablePath(raw.to_string()));
        }
        if raw.split('/').any(|c| c == "..") {
            return Err(ModelError::UnclassifiablePath(raw.to_string()));
        }

        if let Some(rest) = raw.strip_prefix(&conventions.generated_prefix) {
            Ok(Self::generated(rest))
        } else if let Some(rest) = raw.strip_prefix(&conventions.external_prefix) {
            Ok(Self::external(rest))
        } else {
            Ok(Self::project(raw))
        }
    }

    /// Path components, in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|c| !c.is_empty())
    }

    /// The final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Everything before the final path component, or `""` at a root.
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    /// Extension of the final component, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.')
            .filter(|idx| *idx > 0)
            .map(|idx| &name[idx + 1..])
    }
}

impl PartialEq for FilePath {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.path == other.path
    }
}

impl Eq for FilePath {}

impl PartialOrd for FilePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FilePath {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.kind, &self.path).cmp(&(other.kind, &other.path))
    }
}

impl Hash for FilePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PathKind::Project => write!(f, "{}", self.path),
            PathKind::Generated => write!(f, "generated:{}", self.path),
            PathKind::External => write!(f, "external:{}", self.path),
            PathKind::Internal => write!(f, "internal:{}", self.path),
        }
    }
}

/// Prefix conventions used to classify raw extractor paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConventions {
    /// Prefix of generated-output paths, including the trailing slash.
    pub generated_prefix: String,
    /// Prefix of external-repository paths, including the trailing slash.
    pub external_prefix: String,
}

impl Default for PathConventions {
    fn default() -> Self {
        Self {
            generated_prefix: "out/".to_string(),
            external_prefix: "external/".to_string(),
        }
    }
}

impl PathConventions {
    /// Directory name of the generated-output root, without the slash.
    pub fn generated_dir_name(&self) -> &str {
        self.generated_prefix.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_by_prefix() {
        let conventions = PathConventions::default();

        assert_eq!(
            FilePath::classify("a/b.swift", &conventions).unwrap(),
            FilePath::project("a/b.swift")
        );
        assert_eq!(
            FilePath::classify("out/a1b2c/bin/t.c", &conventions).unwrap(),
            FilePath::generated("a1b2c/bin/t.c")
        );
        assert_eq!(
            FilePath::classify("external/a_repo/a.swift", &conventions).unwrap(),
            FilePath::external("a_repo/a.swift")
        );
    }

    #[test]
    fn rejects_unclassifiable_paths() {
        let conventions = PathConventions::default();

        for raw in ["", "/abs/path", "a/../../escape"] {
            assert!(matches!(
                FilePath::classify(raw, &conventions),
                Err(ModelError::UnclassifiablePath(_))
            ));
        }
    }

    #[test]
    fn folder_flag_does_not_split_identity() {
        let plain = FilePath::project("r1/nested");
        let folder = FilePath::project("r1/nested").folder();

        assert_eq!(plain, folder);
        assert_eq!(plain.cmp(&folder), Ordering::Equal);

        let mut set = std::collections::BTreeSet::new();
        set.insert(plain);
        set.insert(folder);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn kind_is_part_of_identity() {
        assert_ne!(FilePath::project("a/b.h"), FilePath::generated("a/b.h"));
    }

    #[test]
    fn path_accessors() {
        let path = FilePath::project("a/b/c.swift");
        assert_eq!(path.file_name(), "c.swift");
        assert_eq!(path.parent(), "a/b");
        assert_eq!(path.extension(), Some("swift"));
        assert_eq!(FilePath::project("README").extension(), None);
    }
}
