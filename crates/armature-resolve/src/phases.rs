//! Build phase synthesis
//!
//! Classifies each final target's resolved inputs into ordered phase
//! groups and derives the target's link manifest. Phases reference tree
//! nodes, so container collapse and variant grouping have already been
//! applied by the time entries are collected.

use std::collections::BTreeSet;

use armature_core::{FilePath, ProductType, Target};
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::products::Products;
use crate::tree::{natural_cmp, FileTree, NodeId};

/// Shared placeholder compiled into targets that declare no sources.
pub const COMPILE_STUB_PATH: &str = "CompileStub.swift";

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "inc", "ipp", "pch"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderVisibility {
    Public,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub node: NodeId,
    pub visibility: HeaderVisibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub node: NodeId,
    /// Per-file compiler flag override, e.g. the ARC-off flag.
    pub compiler_flags: Option<String>,
}

/// A copy-resources entry: either a tree node or another target's
/// product (a dependency resource bundle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceEntry {
    Node(NodeId),
    Product(armature_core::TargetId),
}

/// An embed-frameworks entry with its copy attributes. The attributes
/// travel with the entry so the writer never has to hardcode them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedEntry {
    pub node: NodeId,
    pub code_sign_on_copy: bool,
    pub remove_headers_on_copy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildPhase {
    Headers {
        entries: Vec<HeaderEntry>,
    },
    Sources {
        entries: Vec<SourceEntry>,
    },
    Script {
        name: String,
        input_paths: Vec<String>,
        output_paths: Vec<String>,
        script: String,
        show_env_vars: bool,
    },
    LinkFrameworks {
        entries: Vec<NodeId>,
    },
    CopyResources {
        entries: Vec<ResourceEntry>,
    },
    /// Copies the linked frameworks into the product's Frameworks
    /// directory.
    EmbedFrameworks {
        entries: Vec<EmbedEntry>,
    },
}

/// The generated file list of a target's link inputs: one path per
/// declared link, in order, with a trailing line break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkManifest {
    pub path: FilePath,
    pub content: String,
}

/// Synthesize the link manifest for a target, if it links anything. The
/// manifest lives under the internal root, namespaced by the target's
/// output directory segment and display name so colliding base names
/// cannot collide on manifest paths.
pub fn link_manifest(target: &Target, display_name: &str) -> Option<LinkManifest> {
    if target.links.is_empty() {
        return None;
    }
    let path = FilePath::internal(format!(
        "targets/{}/{}/{}.LinkFileList",
        target.output_dir_segment(),
        display_name,
        target.product.name,
    ));
    let mut content = target.links.join("\n");
    content.push('\n');
    Some(LinkManifest { path, content })
}

/// Partition a target's resolved inputs into its ordered build phases.
pub fn synthesize_phases(
    target: &Target,
    tree: &FileTree,
    products: &Products,
) -> Result<Vec<BuildPhase>, ResolveError> {
    let mut phases = Vec::new();

    if let Some(phase) = headers_phase(target, tree)? {
        phases.push(phase);
    }
    if let Some(phase) = sources_phase(target, tree)? {
        phases.push(phase);
    }
    if target.is_swift {
        phases.push(copy_generated_header_phase());
    }
    if let Some(phase) = link_frameworks_phase(target, tree)? {
        phases.push(phase);
    }
    if let Some(phase) = copy_resources_phase(target, tree, products)? {
        phases.push(phase);
    }
    if let Some(phase) = embed_frameworks_phase(target, tree)? {
        phases.push(phase);
    }

    Ok(phases)
}

fn node_for(tree: &FileTree, path: &FilePath) -> Result<NodeId, ResolveError> {
    tree.lookup(path)
        .ok_or_else(|| ResolveError::Internal(format!("path missing from file tree: {path}")))
}

fn is_header(path: &FilePath) -> bool {
    path.extension()
        .is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext))
}

/// Framework-style products publish headers: declared public headers
/// with the Public attribute, header files found among the sources with
/// project visibility.
fn headers_phase(target: &Target, tree: &FileTree) -> Result<Option<BuildPhase>, ResolveError> {
    if !matches!(
        target.product.kind,
        ProductType::Framework | ProductType::StaticFramework
    ) {
        return Ok(None);
    }

    let mut entries = Vec::new();
    for path in &target.inputs.hdrs {
        entries.push(HeaderEntry {
            node: node_for(tree, path)?,
            visibility: HeaderVisibility::Public,
        });
    }
    for path in target.inputs.srcs.iter().filter(|path| is_header(path)) {
        entries.push(HeaderEntry {
            node: node_for(tree, path)?,
            visibility: HeaderVisibility::Project,
        });
    }
    if entries.is_empty() {
        return Ok(None);
    }

    entries.sort_by(|a, b| natural_cmp(tree.display_name(a.node), tree.display_name(b.node)));
    entries.dedup_by_key(|entry| entry.node);
    Ok(Some(BuildPhase::Headers { entries }))
}

/// Every compile-requiring target gets a sources phase. Targets without
/// declared sources compile the shared placeholder so they stay
/// independently buildable.
fn sources_phase(target: &Target, tree: &FileTree) -> Result<Option<BuildPhase>, ResolveError> {
    if target.inputs.srcs.is_empty() && target.inputs.non_arc_srcs.is_empty() {
        if !target.product.kind.needs_compile_phase() {
            return Ok(None);
        }
        let stub = node_for(tree, &FilePath::internal(COMPILE_STUB_PATH))?;
        return Ok(Some(BuildPhase::Sources {
            entries: vec![SourceEntry {
                node: stub,
                compiler_flags: None,
            }],
        }));
    }

    let mut entries = Vec::new();
    for path in &target.inputs.srcs {
        entries.push(SourceEntry {
            node: node_for(tree, path)?,
            compiler_flags: None,
        });
    }
    for path in &target.inputs.non_arc_srcs {
        entries.push(SourceEntry {
            node: node_for(tree, path)?,
            compiler_flags: Some("-fno-objc-arc".to_string()),
        });
    }

    entries.sort_by(|a, b| natural_cmp(tree.display_name(a.node), tree.display_name(b.node)));
    entries.dedup_by_key(|entry| entry.node);
    Ok(Some(BuildPhase::Sources { entries }))
}

/// Swift targets copy the generated interface header next to the built
/// product so mixed-language consumers can find it.
fn copy_generated_header_phase() -> BuildPhase {
    BuildPhase::Script {
        name: "Copy Swift Generated Header".to_string(),
        input_paths: vec!["$(DERIVED_FILE_DIR)/$(SWIFT_OBJC_INTERFACE_HEADER_NAME)".to_string()],
        output_paths: vec![
            "$(BUILT_PRODUCTS_DIR)/$(SWIFT_OBJC_INTERFACE_HEADER_NAME)".to_string(),
        ],
        script: "cp \"${SCRIPT_INPUT_FILE_0}\" \"${SCRIPT_OUTPUT_FILE_0}\"\n".to_string(),
        show_env_vars: false,
    }
}

fn link_frameworks_phase(
    target: &Target,
    tree: &FileTree,
) -> Result<Option<BuildPhase>, ResolveError> {
    if target.frameworks.is_empty() {
        return Ok(None);
    }
    let mut entries = Vec::new();
    for path in &target.frameworks {
        entries.push(node_for(tree, path)?);
    }
    entries.sort_by(|a, b| natural_cmp(tree.display_name(*a), tree.display_name(*b)));
    Ok(Some(BuildPhase::LinkFrameworks { entries }))
}

/// Bundle-style products copy their resources: tree nodes (variant
/// groups and containers already deduplicated) plus the products of
/// dependency resource bundles.
fn copy_resources_phase(
    target: &Target,
    tree: &FileTree,
    products: &Products,
) -> Result<Option<BuildPhase>, ResolveError> {
    if !target.product.kind.is_bundle() {
        return Ok(None);
    }
    if target.inputs.resources.is_empty() && target.resource_bundles.is_empty() {
        return Ok(None);
    }

    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();
    for path in &target.inputs.resources {
        let node = node_for(tree, path)?;
        if seen.insert(node) {
            entries.push((
                tree.display_name(node).to_string(),
                ResourceEntry::Node(node),
            ));
        }
    }
    for bundle in &target.resource_bundles {
        let entry =
            products
                .by_path(bundle)
                .ok_or_else(|| ResolveError::UnknownResourceBundle {
                    target: target.id.clone(),
                    bundle: bundle.clone(),
                })?;
        entries.push((
            entry.product.basename().to_string(),
            ResourceEntry::Product(entry.target.clone()),
        ));
    }

    entries.sort_by(|(a, _), (b, _)| natural_cmp(a, b));
    Ok(Some(BuildPhase::CopyResources {
        entries: entries.into_iter().map(|(_, entry)| entry).collect(),
    }))
}

/// Bundle-style products embed the dynamic frameworks they link,
/// re-signed and with their header directories stripped.
fn embed_frameworks_phase(
    target: &Target,
    tree: &FileTree,
) -> Result<Option<BuildPhase>, ResolveError> {
    if !target.product.kind.is_bundle() || target.frameworks.is_empty() {
        return Ok(None);
    }
    let mut entries = Vec::new();
    for path in &target.frameworks {
        entries.push(EmbedEntry {
            node: node_for(tree, path)?,
            code_sign_on_copy: true,
            remove_headers_on_copy: true,
        });
    }
    entries.sort_by(|a, b| natural_cmp(tree.display_name(a.node), tree.display_name(b.node)));
    Ok(Some(BuildPhase::EmbedFrameworks { entries }))
}
