//! The whole build-graph input.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::file_path::FilePath;
use crate::label::Label;
use crate::setting::SettingValue;
use crate::target::{Target, TargetId};

/// The immutable input to a resolution run: every target the extractor
/// found, plus project-wide settings and file references not owned by
/// any target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub label: Label,
    #[serde(default)]
    pub build_settings: BTreeMap<String, SettingValue>,
    pub targets: BTreeMap<TargetId, Target>,
    /// Target id to the set of targets it may be absorbed into.
    #[serde(default)]
    pub merge_candidates: BTreeMap<TargetId, BTreeSet<TargetId>>,
    /// Product paths that must remain independently linkable; targets
    /// producing them are never merged away.
    #[serde(default)]
    pub required_links: BTreeSet<String>,
    /// File references not owned by any target.
    #[serde(default)]
    pub extra_files: BTreeSet<FilePath>,
}

impl Project {
    /// Build a project from an extracted target list. Duplicate target
    /// ids are an input-contract violation.
    pub fn new(
        name: impl Into<String>,
        label: Label,
        build_settings: BTreeMap<String, SettingValue>,
        targets: Vec<Target>,
        merge_candidates: BTreeMap<TargetId, BTreeSet<TargetId>>,
        required_links: BTreeSet<String>,
        extra_files: BTreeSet<FilePath>,
    ) -> Result<Self, ModelError> {
        let mut map = BTreeMap::new();
        for target in targets {
            let id = target.id.clone();
            if map.insert(id.clone(), target).is_some() {
                return Err(ModelError::DuplicateTarget(id.to_string()));
            }
        }
        Ok(Self {
            name: name.into(),
            label,
            build_settings,
            targets: map,
            merge_candidates,
            required_links,
            extra_files,
        })
    }
}
