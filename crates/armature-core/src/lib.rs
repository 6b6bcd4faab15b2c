//! Core build-graph model for armature
//!
//! These types describe the *input* to the resolution pipeline: the
//! targets, settings, and file references an upstream extractor pulled
//! out of build-system metadata. Everything here is immutable once
//! constructed; the pipeline in `armature-resolve` only ever derives new
//! structures from it.

pub mod error;
pub mod file_path;
pub mod label;
pub mod platform;
pub mod product;
pub mod project;
pub mod setting;
pub mod target;

pub use error::ModelError;
pub use file_path::{FilePath, PathConventions, PathKind};
pub use label::Label;
pub use platform::{Os, Platform};
pub use product::{Product, ProductType};
pub use project::Project;
pub use setting::SettingValue;
pub use target::{Target, TargetId, TargetInputs};
