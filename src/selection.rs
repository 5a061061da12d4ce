/*!
 * Selection tracking and resolution into a flat file list
 */

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::Result;
use crate::policy::normalize;
use crate::tree::TreeIndex;
use crate::walker::DirectoryWalker;

/// Ordered set of checked path ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from ids in order, ignoring repeats
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for id in ids {
            set.insert(id);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Ids in selection order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Add `id`; returns false if it was already present
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.members.insert(id.clone()) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    /// Remove `id`; returns false if it was absent
    pub fn remove(&mut self, id: &str) -> bool {
        if self.members.remove(id) {
            self.order.retain(|x| x != id);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Checkbox toggle with cascade semantics.
    ///
    /// Checking a directory records only the directory; its files are
    /// derived at resolve time. Unchecking removes the node and its loaded
    /// descendants, and splits any checked ancestor into its remaining
    /// loaded children.
    pub fn toggle(&mut self, id: &str, checked: bool, index: &TreeIndex) {
        if checked {
            self.insert(id);
            return;
        }

        self.remove(id);
        for descendant in index.descendants(id) {
            self.remove(&descendant);
        }

        let ancestors = index.ancestors(id);
        let Some(top) = ancestors.iter().rposition(|a| self.contains(a)) else {
            return;
        };

        // Walk from the highest checked ancestor down to `id`
        let mut chain: Vec<&str> = ancestors[..=top].iter().rev().map(String::as_str).collect();
        chain.push(id);
        for pair in chain.windows(2) {
            let (node, next) = (pair[0], pair[1]);
            self.remove(node);
            for child in index.children(node) {
                if child != next {
                    self.insert(child.as_str());
                }
            }
        }
    }
}

/// Flat, deduplicated file list produced from a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Files in selection order, first occurrence wins
    pub files: Vec<PathBuf>,
    /// Excluded directories met while expanding directory selections
    pub skipped_dirs: usize,
}

impl Resolution {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// No files found under any selection
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Drop `path` from the file list, comparing resolved locations.
    /// Returns whether anything was removed.
    pub fn exclude(&mut self, path: &Path) -> bool {
        let target = fs::canonicalize(path).unwrap_or_else(|_| normalize(path));
        let before = self.files.len();
        self.files.retain(|file| {
            let real = fs::canonicalize(file).unwrap_or_else(|_| normalize(file));
            real != target
        });
        self.files.len() != before
    }
}

enum Selected {
    File(PathBuf),
    Directory(PathBuf),
}

/// Expands selections into the files to concatenate
pub struct SelectionResolver<'a> {
    walker: &'a DirectoryWalker,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(walker: &'a DirectoryWalker) -> Self {
        Self { walker }
    }

    /// Resolve `selection` against the current tree shape.
    ///
    /// Directories are expanded recursively through the walker, so
    /// children discovered after the selection was made are included.
    /// Ids missing from `index` are looked up on disk.
    pub fn resolve(&self, selection: &SelectionSet, index: &TreeIndex) -> Result<Resolution> {
        let mut selected = Vec::with_capacity(selection.len());
        for id in selection.iter() {
            let path = normalize(Path::new(id));
            let is_dir = match index.is_directory(id) {
                Some(is_dir) => is_dir,
                None => self.walker.describe(&path)?.is_directory,
            };
            selected.push(if is_dir {
                Selected::Directory(path)
            } else {
                Selected::File(path)
            });
        }

        // Subtrees are independent; collect keeps selection order
        let expanded: Vec<Result<(Vec<PathBuf>, usize)>> = selected
            .par_iter()
            .map(|item| self.expand(item))
            .collect();

        let mut seen = HashSet::new();
        let mut resolution = Resolution::default();
        for result in expanded {
            let (files, skipped) = result?;
            resolution.skipped_dirs += skipped;
            for file in files {
                if seen.insert(file.clone()) {
                    resolution.files.push(file);
                }
            }
        }

        log::info!(
            "Resolved {} selections into {} files",
            selection.len(),
            resolution.files.len()
        );
        Ok(resolution)
    }

    fn expand(&self, item: &Selected) -> Result<(Vec<PathBuf>, usize)> {
        match item {
            Selected::File(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if self.walker.classifier().is_text_file(&name) {
                    Ok((vec![path.clone()], 0))
                } else {
                    log::debug!("Skipping non-text selection {}", path.display());
                    Ok((Vec::new(), 0))
                }
            }
            Selected::Directory(path) => {
                let listing = self.walker.walk(path, true)?;
                let files = listing
                    .entries
                    .into_iter()
                    .filter(|e| !e.is_directory)
                    .map(|e| PathBuf::from(e.id))
                    .collect();
                Ok((files, listing.skipped_dirs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PathEntry;

    fn entry(id: &str, is_directory: bool) -> PathEntry {
        PathEntry {
            id: id.to_string(),
            name: id.rsplit('/').next().unwrap_or_default().to_string(),
            is_directory,
        }
    }

    fn index() -> TreeIndex {
        let mut index = TreeIndex::new(Path::new("/proj"));
        index
            .attach(
                "/proj",
                vec![entry("/proj/src", true), entry("/proj/README.md", false)],
            )
            .unwrap();
        index
            .attach(
                "/proj/src",
                vec![entry("/proj/src/a.rs", false), entry("/proj/src/b.rs", false)],
            )
            .unwrap();
        index
    }

    #[test]
    fn insert_keeps_first_order() {
        let set = SelectionSet::from_ids(["b", "a", "b"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn uncheck_removes_descendants() {
        let index = index();
        let mut set = SelectionSet::from_ids(["/proj/src", "/proj/src/a.rs", "/proj/README.md"]);
        set.toggle("/proj/src", false, &index);
        assert_eq!(set.iter().collect::<Vec<_>>(), ["/proj/README.md"]);
    }

    #[test]
    fn uncheck_child_splits_checked_ancestors() {
        let index = index();
        let mut set = SelectionSet::new();
        set.toggle("/proj", true, &index);
        set.toggle("/proj/src/a.rs", false, &index);

        assert!(!set.contains("/proj"));
        assert!(!set.contains("/proj/src"));
        assert!(!set.contains("/proj/src/a.rs"));
        assert!(set.contains("/proj/README.md"));
        assert!(set.contains("/proj/src/b.rs"));
    }

    #[test]
    fn exclude_drops_the_output_file_only() {
        let mut resolution = Resolution {
            files: vec![
                PathBuf::from("/proj/a.py"),
                PathBuf::from("/proj/concatenated-files.md"),
            ],
            skipped_dirs: 0,
        };
        assert!(resolution.exclude(Path::new("/proj/./concatenated-files.md")));
        assert_eq!(resolution.files, vec![PathBuf::from("/proj/a.py")]);
        assert!(!resolution.exclude(Path::new("/proj/other.md")));
    }
}
