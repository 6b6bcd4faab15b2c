//! Rendering of classified paths into concrete setting strings.
//!
//! The writer and the build tooling see paths in three shapes: rooted at
//! `$(PROJECT_DIR)`, rooted at `$(BUILD_DIR)` for per-configuration
//! outputs, or absolute for file lists consumed outside the IDE.

use armature_core::{FilePath, PathKind};

use crate::ProjectOptions;

pub struct PathResolver<'a> {
    options: &'a ProjectOptions,
}

impl<'a> PathResolver<'a> {
    pub fn new(options: &'a ProjectOptions) -> Self {
        Self { options }
    }

    /// Default rendering, rooted at `$(PROJECT_DIR)`.
    pub fn resolve(&self, path: &FilePath) -> String {
        match path.kind {
            PathKind::Project => format!("$(PROJECT_DIR)/{}", path.path),
            PathKind::Generated => format!(
                "$(PROJECT_DIR)/{}/{}",
                self.options.conventions.generated_dir_name(),
                path.path
            ),
            PathKind::External => format!("{}/{}", self.options.external_root, path.path),
            PathKind::Internal => format!("{}/{}", self.internal_prefix(), path.path),
        }
    }

    /// Rendering for per-configuration build outputs: generated paths
    /// move under `$(BUILD_DIR)`, everything else is unchanged.
    pub fn resolve_build_dir(&self, path: &FilePath) -> String {
        match path.kind {
            PathKind::Generated => format!(
                "$(BUILD_DIR)/{}/{}",
                self.options.conventions.generated_dir_name(),
                path.path
            ),
            _ => self.resolve(path),
        }
    }

    /// Absolute rendering for generated and external paths, used by
    /// file lists that are read outside the IDE's variable expansion.
    pub fn resolve_absolute(&self, path: &FilePath) -> String {
        match path.kind {
            PathKind::Generated => format!("{}/{}", self.options.generated_root, path.path),
            _ => self.resolve(path),
        }
    }

    fn internal_prefix(&self) -> String {
        if self.options.workspace_output_path.is_empty() {
            format!("$(PROJECT_DIR)/{}", self.options.internal_dir_name)
        } else {
            format!(
                "$(PROJECT_DIR)/{}/{}",
                self.options.workspace_output_path, self.options.internal_dir_name
            )
        }
    }
}
