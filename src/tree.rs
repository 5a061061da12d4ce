/*!
 * Index-backed directory tree
 *
 * Nodes live in a map keyed by path id and refer to their parent and
 * children by id, so the tree has no owning back-references.
 */

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{ConcatError, Result};
use crate::types::{PathEntry, TreeNode};
use crate::utils::file_name_of;

/// One node of the index
#[derive(Debug, Clone)]
pub struct IndexedNode {
    pub entry: PathEntry,
    pub parent: Option<String>,
    /// `None` until a directory has been expanded
    pub children: Option<Vec<String>>,
}

/// Map of path id to node, rooted at one directory
#[derive(Debug, Clone)]
pub struct TreeIndex {
    root: String,
    nodes: HashMap<String, IndexedNode>,
}

impl TreeIndex {
    /// Create an index holding only the root directory
    pub fn new(root: &Path) -> Self {
        let id = root.to_string_lossy().to_string();
        let mut nodes = HashMap::new();
        nodes.insert(
            id.clone(),
            IndexedNode {
                entry: PathEntry {
                    id: id.clone(),
                    name: file_name_of(root),
                    is_directory: true,
                },
                parent: None,
                children: None,
            },
        );
        Self { root: id, nodes }
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&IndexedNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_directory(&self, id: &str) -> Option<bool> {
        self.nodes.get(id).map(|n| n.entry.is_directory)
    }

    /// Whether the children of `id` have been loaded
    pub fn is_loaded(&self, id: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|n| n.children.is_some())
    }

    /// Loaded children of `id`, empty when unknown or not yet expanded
    pub fn children(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .and_then(|n| n.children.as_deref())
            .unwrap_or(&[])
    }

    /// Attach a listing under `parent_id`, replacing any previous children
    pub fn attach(&mut self, parent_id: &str, entries: Vec<PathEntry>) -> Result<()> {
        match self.nodes.get(parent_id) {
            Some(node) if node.entry.is_directory => {}
            Some(_) => {
                return Err(ConcatError::Validation(format!(
                    "Not a directory node: {parent_id}"
                )))
            }
            None => return Err(ConcatError::NotFound(PathBuf::from(parent_id))),
        }

        // Drop stale subtrees from an earlier expansion
        for stale in self.descendants(parent_id) {
            self.nodes.remove(&stale);
        }

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            ids.push(entry.id.clone());
            self.nodes.insert(
                entry.id.clone(),
                IndexedNode {
                    entry,
                    parent: Some(parent_id.to_string()),
                    children: None,
                },
            );
        }

        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children = Some(ids);
        }
        Ok(())
    }

    /// Ancestors of `id`, nearest first, excluding `id`
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent.clone());
        while let Some(parent) = current {
            current = self.nodes.get(&parent).and_then(|n| n.parent.clone());
            out.push(parent);
        }
        out
    }

    /// Loaded descendants of `id` in pre-order, excluding `id`
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&String> = self.children(id).iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next.clone());
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Nested view of the subtree at `id`
    pub fn to_tree(&self, id: &str) -> Option<TreeNode> {
        let node = self.nodes.get(id)?;
        let children = node.children.as_ref().map(|ids| {
            ids.iter()
                .filter_map(|child| self.to_tree(child))
                .collect::<Vec<_>>()
        });
        Some(TreeNode {
            entry: node.entry.clone(),
            children,
        })
    }

    /// Indented text rendering of the whole tree
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(&self.root, 0, &mut out);
        out
    }

    fn render_node(&self, id: &str, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let marker = if node.entry.is_directory { "/" } else { "" };
        let _ = writeln!(out, "{}{}{}", "  ".repeat(depth), node.entry.name, marker);
        for child in self.children(id) {
            self.render_node(child, depth + 1, out);
        }
    }
}
