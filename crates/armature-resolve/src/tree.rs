//! File path resolution and group building
//!
//! Every file path referenced by any target, plus the project's extra
//! files, is canonicalized into one shared tree of group nodes. The tree
//! has four roots, one per path kind. Directory components become
//! intermediate groups, container-like paths collapse into a single
//! file reference, and localized resource variants collapse into
//! variant groups. Building the tree twice from the same path set yields
//! a structurally identical arena.

use std::collections::{BTreeSet, HashMap};

use armature_core::{FilePath, PathKind};
use serde::{Deserialize, Serialize};

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

/// One node of the file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// A directory-like group.
    Group { name: String, children: Vec<NodeId> },
    /// A file reference. `path.is_folder` marks folder references,
    /// which sort with groups.
    File { name: String, path: FilePath },
    /// A localized variant group; children are per-locale file leaves
    /// named by locale.
    Variant { name: String, children: Vec<NodeId> },
}

impl Node {
    pub fn display_name(&self) -> &str {
        match self {
            Node::Group { name, .. } | Node::File { name, .. } | Node::Variant { name, .. } => name,
        }
    }
}

/// The canonical file tree: an arena of nodes plus an index from every
/// referenced `FilePath` to the node that represents it. Paths nested
/// inside containers and localized variants map to their container or
/// variant-group node.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTree {
    nodes: Vec<Node>,
    by_path: HashMap<FilePath, NodeId>,
    pub project_root: NodeId,
    pub generated_root: NodeId,
    pub external_root: NodeId,
    pub internal_root: NodeId,
}

impl FileTree {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The node representing a path, if the path is in the tree.
    pub fn lookup(&self, path: &FilePath) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn display_name(&self, id: NodeId) -> &str {
        self.node(id).display_name()
    }

    /// Canonical file paths in the tree: one per file-reference node,
    /// including variant-group members.
    pub fn file_paths(&self) -> impl Iterator<Item = &FilePath> {
        self.nodes.iter().filter_map(|node| match node {
            Node::File { path, .. } => Some(path),
            _ => None,
        })
    }

    /// The elements of the top-level project container: the project
    /// root's children, followed by the non-project roots that have any
    /// content, in fixed kind order.
    pub fn root_elements(&self) -> Vec<NodeId> {
        let mut elements = match self.node(self.project_root) {
            Node::Group { children, .. } => children.clone(),
            _ => Vec::new(),
        };
        for root in [self.generated_root, self.external_root, self.internal_root] {
            if let Node::Group { children, .. } = self.node(root) {
                if !children.is_empty() {
                    elements.push(root);
                }
            }
        }
        elements
    }
}

/// Path components terminating descent: everything at or below them is
/// an alias of the container itself.
const CONTAINER_EXTENSIONS: &[&str] = &["xcassets", "framework", "bundle", "docc"];

fn container_extension(component: &str) -> bool {
    component
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && CONTAINER_EXTENSIONS.contains(&ext))
}

fn locale_directory(component: &str) -> Option<&str> {
    component.strip_suffix(".lproj").filter(|l| !l.is_empty())
}

fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Build the canonical tree from a deduplicated path set.
///
/// The input is a `BTreeSet` so the arena layout is a pure function of
/// the path set, independent of how callers accumulated it.
pub fn build_tree(paths: &BTreeSet<FilePath>, internal_dir_name: &str) -> FileTree {
    let mut builder = TreeBuilder::new(internal_dir_name);
    for path in paths {
        builder.insert(path);
    }
    builder.finish()
}

struct TreeBuilder {
    nodes: Vec<Node>,
    by_path: HashMap<FilePath, NodeId>,
    project_root: NodeId,
    generated_root: NodeId,
    external_root: NodeId,
    internal_root: NodeId,
    groups: HashMap<(NodeId, String), NodeId>,
    variants: HashMap<(NodeId, String), NodeId>,
}

impl TreeBuilder {
    fn new(internal_dir_name: &str) -> Self {
        let mut nodes = Vec::new();
        let mut root = |name: &str| {
            let id = NodeId(nodes.len());
            nodes.push(Node::Group {
                name: name.to_string(),
                children: Vec::new(),
            });
            id
        };
        let project_root = root("");
        let generated_root = root("Generated Files");
        let external_root = root("External Repositories");
        let internal_root = root(internal_dir_name);

        Self {
            nodes,
            by_path: HashMap::new(),
            project_root,
            generated_root,
            external_root,
            internal_root,
            groups: HashMap::new(),
            variants: HashMap::new(),
        }
    }

    fn root_of(&self, kind: PathKind) -> NodeId {
        match kind {
            PathKind::Project => self.project_root,
            PathKind::Generated => self.generated_root,
            PathKind::External => self.external_root,
            PathKind::Internal => self.internal_root,
        }
    }

    fn add_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        match &mut self.nodes[parent.0] {
            Node::Group { children, .. } | Node::Variant { children, .. } => children.push(id),
            Node::File { .. } => unreachable!("files have no children"),
        }
        id
    }

    fn insert(&mut self, path: &FilePath) {
        if self.by_path.contains_key(path) {
            return;
        }

        let components: Vec<&str> = path.components().collect();
        let mut current = self.root_of(path.kind);
        let mut prefix = String::new();

        for (index, component) in components.iter().enumerate() {
            let last = index + 1 == components.len();
            let component_path = if prefix.is_empty() {
                (*component).to_string()
            } else {
                format!("{prefix}/{component}")
            };

            if container_extension(component) {
                self.insert_container(path, component, component_path, current);
                return;
            }

            if !last {
                if let Some(locale) = locale_directory(component) {
                    if index + 2 == components.len() {
                        self.insert_variant_member(path, current, locale, components[index + 1]);
                        return;
                    }
                }
                current = self.group_child(current, component, component_path.clone());
                prefix = component_path;
                continue;
            }

            let node = self.add_node(
                current,
                Node::File {
                    name: (*component).to_string(),
                    path: path.clone(),
                },
            );
            self.by_path.insert(path.clone(), node);
        }
    }

    /// The container becomes one file reference; every path at or below
    /// it aliases that node.
    fn insert_container(
        &mut self,
        path: &FilePath,
        component: &str,
        component_path: String,
        parent: NodeId,
    ) {
        let container = FilePath {
            kind: path.kind,
            path: component_path,
            is_folder: false,
        };
        let node = match self.by_path.get(&container) {
            Some(node) => *node,
            None => {
                let node = self.add_node(
                    parent,
                    Node::File {
                        name: component.to_string(),
                        path: container.clone(),
                    },
                );
                self.by_path.insert(container, node);
                node
            }
        };
        self.by_path.insert(path.clone(), node);
    }

    /// A `<locale>.lproj/<file>` pair joins the variant group for the
    /// file's stem under the parent group, as a leaf named by locale.
    fn insert_variant_member(
        &mut self,
        path: &FilePath,
        parent: NodeId,
        locale: &str,
        file: &str,
    ) {
        let stem = file_stem(file).to_string();
        let variant = match self.variants.get(&(parent, stem.clone())) {
            Some(variant) => *variant,
            None => {
                let variant = self.add_node(
                    parent,
                    Node::Variant {
                        name: file.to_string(),
                        children: Vec::new(),
                    },
                );
                self.variants.insert((parent, stem), variant);
                variant
            }
        };

        self.add_node(
            variant,
            Node::File {
                name: locale.to_string(),
                path: path.clone(),
            },
        );
        self.rename_variant(variant);
        self.by_path.insert(path.clone(), variant);
    }

    /// A variant group is named after its lexicographically smallest
    /// non-`.strings` member when one exists; `.strings` files localize
    /// some other resource and should not name the group.
    fn rename_variant(&mut self, variant: NodeId) {
        let children = match &self.nodes[variant.0] {
            Node::Variant { children, .. } => children.clone(),
            _ => return,
        };
        let mut members: Vec<&str> = children
            .iter()
            .filter_map(|child| match &self.nodes[child.0] {
                Node::File { path, .. } => Some(path.file_name()),
                _ => None,
            })
            .collect();
        members.sort_unstable();

        let name = members
            .iter()
            .find(|name| !name.ends_with(".strings"))
            .or_else(|| members.first())
            .map(|name| (*name).to_string());

        if let (Some(name), Node::Variant { name: slot, .. }) =
            (name, &mut self.nodes[variant.0])
        {
            *slot = name;
        }
    }

    fn group_child(&mut self, parent: NodeId, component: &str, component_path: String) -> NodeId {
        let key = (parent, component_path);
        if let Some(existing) = self.groups.get(&key) {
            return *existing;
        }
        let id = self.add_node(
            parent,
            Node::Group {
                name: component.to_string(),
                children: Vec::new(),
            },
        );
        self.groups.insert(key, id);
        id
    }

    fn finish(mut self) -> FileTree {
        for index in 0..self.nodes.len() {
            let mut children = match &self.nodes[index] {
                Node::Group { children, .. } | Node::Variant { children, .. } => children.clone(),
                Node::File { .. } => continue,
            };
            children.sort_by(|a, b| {
                let bucket_a = sort_bucket(&self.nodes[a.0]);
                let bucket_b = sort_bucket(&self.nodes[b.0]);
                bucket_a.cmp(&bucket_b).then_with(|| {
                    natural_cmp(
                        self.nodes[a.0].display_name(),
                        self.nodes[b.0].display_name(),
                    )
                })
            });
            match &mut self.nodes[index] {
                Node::Group { children: slot, .. } | Node::Variant { children: slot, .. } => {
                    *slot = children
                }
                Node::File { .. } => unreachable!(),
            }
        }

        FileTree {
            nodes: self.nodes,
            by_path: self.by_path,
            project_root: self.project_root,
            generated_root: self.generated_root,
            external_root: self.external_root,
            internal_root: self.internal_root,
        }
    }
}

/// Groups and folder references sort before file references and variant
/// groups.
fn sort_bucket(node: &Node) -> u8 {
    match node {
        Node::Group { .. } => 0,
        Node::File { path, .. } if path.is_folder => 0,
        Node::File { .. } | Node::Variant { .. } => 1,
    }
}

/// Locale-aware ordering: case-insensitive, with digit runs compared
/// numerically. Ties fall back to the raw strings so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let mut ac = a.chars().peekable();
    let mut bc = b.chars().peekable();

    loop {
        match (ac.peek().copied(), bc.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                if x.is_ascii_digit() && y.is_ascii_digit() {
                    let mut run_a = String::new();
                    while let Some(d) = ac.peek().filter(|c| c.is_ascii_digit()) {
                        run_a.push(*d);
                        ac.next();
                    }
                    let mut run_b = String::new();
                    while let Some(d) = bc.peek().filter(|c| c.is_ascii_digit()) {
                        run_b.push(*d);
                        bc.next();
                    }
                    let trim_a = run_a.trim_start_matches('0');
                    let trim_b = run_b.trim_start_matches('0');
                    let ordering = trim_a
                        .len()
                        .cmp(&trim_b.len())
                        .then_with(|| trim_a.cmp(trim_b))
                        .then_with(|| run_a.cmp(&run_b));
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                } else {
                    let fx = x.to_lowercase().next().unwrap_or(x);
                    let fy = y.to_lowercase().next().unwrap_or(y);
                    if fx != fy {
                        return fx.cmp(&fy);
                    }
                    ac.next();
                    bc.next();
                }
            }
        }
    }
}
