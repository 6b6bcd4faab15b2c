//! Resolution pipeline for armature
//!
//! Turns an extracted build graph into a fully resolved project model:
//! merged and disambiguated targets, a canonical file tree, a product
//! catalog, synthesized build phases, wired dependencies, and assembled
//! build settings. The stages run strictly in order, each consuming the
//! previous stage's immutable output; the first fatal error aborts the
//! run so the writer never sees a partial model.

pub mod disambiguate;
pub mod error;
pub mod merge;
pub mod path_resolver;
pub mod phases;
pub mod products;
pub mod settings;
pub mod tree;
pub mod wiring;

use std::collections::{BTreeMap, BTreeSet};

use armature_core::{
    FilePath, Label, PathConventions, PathKind, Platform, Product, Project, SettingValue,
    TargetId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use disambiguate::{disambiguate_targets, DisambiguatedTarget};
pub use error::ResolveError;
pub use merge::{merge_targets, MergeOutcome, SkipReason, SkippedMerge};
pub use path_resolver::PathResolver;
pub use phases::{
    link_manifest, synthesize_phases, BuildPhase, EmbedEntry, HeaderEntry, HeaderVisibility,
    LinkManifest, ResourceEntry, SourceEntry, COMPILE_STUB_PATH,
};
pub use products::{build_products, ProductEntry, Products};
pub use settings::assemble_settings;
pub use tree::{build_tree, FileTree, Node, NodeId};
pub use wiring::{wire_dependencies, WiredGraph};

/// File list of every generated input the project consumes, used by the
/// aggregate target's build script.
pub const GENERATED_FILE_LIST_PATH: &str = "generated.xcfilelist";

/// Configuration for a resolution run. None of this is hardcoded: the
/// generated/external roots and the internal directory name come from
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOptions {
    /// Absolute path of the build system's generated-output root.
    pub generated_root: String,
    /// Absolute path of the external-dependency root.
    pub external_root: String,
    /// Name of the tool's support directory inside the workspace output.
    pub internal_dir_name: String,
    /// Path of the workspace output directory, relative to the project
    /// directory. May be empty.
    pub workspace_output_path: String,
    #[serde(default)]
    pub conventions: PathConventions,
}

/// Content associated with a file path in the resolved model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Artifact {
    /// Points at an existing file; nothing to materialize.
    Reference,
    /// Carries literal text the writer materializes on disk.
    Generated { content: String },
}

/// One fully resolved target, ready for the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub id: TargetId,
    /// Unique display name.
    pub name: String,
    /// Base name before disambiguation.
    pub base_name: String,
    pub product: Product,
    pub platform: Platform,
    pub phases: Vec<BuildPhase>,
    pub settings: BTreeMap<String, SettingValue>,
    /// Final dependency ids, sorted.
    pub dependencies: Vec<TargetId>,
    /// Whether the target depends on the generated-inputs aggregate.
    pub requires_generated_inputs: bool,
}

/// The synthetic aggregate target that materializes generated inputs
/// before anything compiles.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInputsTarget {
    pub name: String,
    pub file_list: FilePath,
    pub label: Label,
    pub script: String,
}

/// Everything the external writer needs.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    pub name: String,
    pub label: Label,
    /// Final targets, sorted by display name.
    pub targets: Vec<ResolvedTarget>,
    pub generated_inputs: Option<GeneratedInputsTarget>,
    pub products: Products,
    pub tree: FileTree,
    pub artifacts: BTreeMap<FilePath, Artifact>,
}

/// Run the whole pipeline.
pub fn resolve(project: &Project, options: &ProjectOptions) -> Result<ResolvedProject, ResolveError> {
    let resolver = PathResolver::new(options);

    // Stage 1: merge eligible target pairs.
    let outcome = merge_targets(project);
    for skipped in &outcome.skipped {
        warn!(
            src = %skipped.src,
            reason = ?skipped.reason,
            "unable to merge target; leaving it standalone"
        );
    }

    // Stage 2: unique display names.
    let targets = disambiguate_targets(outcome.targets);

    // Link manifests are needed both as tree inputs and as settings, so
    // derive them once up front.
    let manifests: BTreeMap<TargetId, LinkManifest> = targets
        .iter()
        .filter_map(|(id, d)| link_manifest(&d.target, &d.name).map(|m| (id.clone(), m)))
        .collect();

    // Stage 3: the canonical file tree.
    let mut paths: BTreeSet<FilePath> = project.extra_files.clone();
    for disambiguated in targets.values() {
        paths.extend(disambiguated.target.referenced_files().cloned());
    }
    let needs_stub = targets.values().any(|d| {
        d.target.inputs.srcs.is_empty()
            && d.target.inputs.non_arc_srcs.is_empty()
            && d.target.product.kind.needs_compile_phase()
    });
    if needs_stub {
        paths.insert(FilePath::internal(COMPILE_STUB_PATH));
    }
    let has_generated = paths.iter().any(|path| path.kind == PathKind::Generated);
    if has_generated {
        paths.insert(FilePath::internal(GENERATED_FILE_LIST_PATH));
    }
    for manifest in manifests.values() {
        paths.insert(manifest.path.clone());
    }
    let tree = build_tree(&paths, &options.internal_dir_name);

    // Stage 4: product catalog.
    let products = build_products(&targets);

    // Stage 5: build phases.
    let mut target_phases: BTreeMap<TargetId, Vec<BuildPhase>> = BTreeMap::new();
    for (id, disambiguated) in &targets {
        let phases = synthesize_phases(&disambiguated.target, &tree, &products)?;
        target_phases.insert(id.clone(), phases);
    }

    // Stage 6: dependency wiring.
    let wired = wire_dependencies(&targets, &outcome.redirects)?;

    // Stage 7: build settings.
    let mut target_settings: BTreeMap<TargetId, BTreeMap<String, SettingValue>> = BTreeMap::new();
    for (id, disambiguated) in &targets {
        let settings = assemble_settings(
            &disambiguated.target,
            &project.build_settings,
            &targets,
            &outcome.redirects,
            manifests.get(id),
            &resolver,
        );
        target_settings.insert(id.clone(), settings);
    }

    let generated_inputs = has_generated.then(|| GeneratedInputsTarget {
        name: "Generated Files".to_string(),
        file_list: FilePath::internal(GENERATED_FILE_LIST_PATH),
        label: project.label.clone(),
        script: format!(
            "\"${{BUILD_TOOL}}\" build --output_groups=generated_inputs {}\n",
            project.label
        ),
    });

    let artifacts = collect_artifacts(&tree, &manifests, needs_stub, has_generated, &resolver);

    let mut resolved_targets = Vec::with_capacity(targets.len());
    for (id, disambiguated) in targets {
        debug!(id = %id, name = %disambiguated.name, "resolved target");
        let target = disambiguated.target;
        resolved_targets.push(ResolvedTarget {
            base_name: target.name().to_string(),
            name: disambiguated.name,
            product: target.product,
            platform: target.platform,
            phases: target_phases.remove(&id).unwrap_or_default(),
            settings: target_settings.remove(&id).unwrap_or_default(),
            dependencies: wired
                .edges
                .get(&id)
                .map(|edges| edges.iter().cloned().collect())
                .unwrap_or_default(),
            requires_generated_inputs: wired.requires_generated.contains(&id),
            id,
        });
    }
    resolved_targets.sort_by(|a, b| tree::natural_cmp(&a.name, &b.name));

    Ok(ResolvedProject {
        name: project.name.clone(),
        label: project.label.clone(),
        targets: resolved_targets,
        generated_inputs,
        products,
        tree,
        artifacts,
    })
}

/// Pair every canonical file path with its artifact: plain references
/// for existing files, generated content for the support files the
/// pipeline synthesizes.
fn collect_artifacts(
    tree: &FileTree,
    manifests: &BTreeMap<TargetId, LinkManifest>,
    needs_stub: bool,
    has_generated: bool,
    resolver: &PathResolver<'_>,
) -> BTreeMap<FilePath, Artifact> {
    let mut artifacts: BTreeMap<FilePath, Artifact> = tree
        .file_paths()
        .map(|path| (path.clone(), Artifact::Reference))
        .collect();

    for manifest in manifests.values() {
        artifacts.insert(
            manifest.path.clone(),
            Artifact::Generated {
                content: manifest.content.clone(),
            },
        );
    }

    if needs_stub {
        artifacts.insert(
            FilePath::internal(COMPILE_STUB_PATH),
            Artifact::Generated {
                content: String::new(),
            },
        );
    }

    if has_generated {
        let mut lines: Vec<String> = tree
            .file_paths()
            .filter(|path| path.kind == PathKind::Generated)
            .map(|path| resolver.resolve_absolute(path))
            .collect();
        lines.sort();
        let mut content = lines.join("\n");
        content.push('\n');
        artifacts.insert(
            FilePath::internal(GENERATED_FILE_LIST_PATH),
            Artifact::Generated { content },
        );
    }

    artifacts
}
