//! Build targets and their declared inputs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::file_path::{FilePath, PathKind};
use crate::label::Label;
use crate::platform::Platform;
use crate::product::Product;
use crate::setting::SettingValue;

/// Stable target identity assigned by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Declared input groups of a target. Source lists are ordered as
/// declared; header and resource sets are unordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInputs {
    #[serde(default)]
    pub srcs: Vec<FilePath>,
    /// Sources compiled with automatic reference counting disabled.
    #[serde(default)]
    pub non_arc_srcs: Vec<FilePath>,
    /// Public headers.
    #[serde(default)]
    pub hdrs: BTreeSet<FilePath>,
    #[serde(default)]
    pub resources: BTreeSet<FilePath>,
}

impl TargetInputs {
    pub fn all(&self) -> impl Iterator<Item = &FilePath> {
        self.srcs
            .iter()
            .chain(self.non_arc_srcs.iter())
            .chain(self.hdrs.iter())
            .chain(self.resources.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.srcs.is_empty()
            && self.non_arc_srcs.is_empty()
            && self.hdrs.is_empty()
            && self.resources.is_empty()
    }
}

/// A single build unit producing one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub label: Label,
    /// Package output directory, relative to the generated-output root's
    /// parent. The first component is the output root directory name,
    /// the second the configuration segment.
    pub package_bin_dir: String,
    pub platform: Platform,
    pub product: Product,
    #[serde(default)]
    pub is_swift: bool,
    #[serde(default)]
    pub build_settings: BTreeMap<String, SettingValue>,
    #[serde(default)]
    pub inputs: TargetInputs,
    /// Prebuilt dynamic framework bundles linked by this target.
    #[serde(default)]
    pub frameworks: BTreeSet<FilePath>,
    #[serde(default)]
    pub modulemaps: BTreeSet<FilePath>,
    #[serde(default)]
    pub swiftmodules: BTreeSet<FilePath>,
    /// Product output paths of dependency resource bundles.
    #[serde(default)]
    pub resource_bundles: BTreeSet<String>,
    /// Ordered linker inputs, as product/archive paths.
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub dependencies: BTreeSet<TargetId>,
    #[serde(default)]
    pub test_host: Option<TargetId>,
}

impl Target {
    /// Base target name, before disambiguation.
    pub fn name(&self) -> &str {
        self.label.name()
    }

    /// Configuration segment of the package output directory, used to
    /// namespace per-target support files.
    pub fn output_dir_segment(&self) -> &str {
        let mut components = self.package_bin_dir.split('/');
        let first = components.next().unwrap_or(&self.package_bin_dir);
        components.next().unwrap_or(first)
    }

    /// Every file path the target contributes to the project tree.
    pub fn referenced_files(&self) -> impl Iterator<Item = &FilePath> {
        self.inputs
            .all()
            .chain(self.frameworks.iter())
            .chain(self.modulemaps.iter())
    }

    /// Whether building this target needs generated inputs materialized
    /// first. Swiftmodules and frameworks are linked outputs, not
    /// compilation inputs, so they do not count.
    pub fn requires_generated_inputs(&self) -> bool {
        self.inputs
            .all()
            .chain(self.modulemaps.iter())
            .any(|path| path.kind == PathKind::Generated)
    }
}
