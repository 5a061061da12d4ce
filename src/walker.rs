/*!
 * Directory listing and traversal
 *
 * Every listing is gated by the [`PathPolicy`]. Excluded directory names
 * are neither listed nor descended into, files are kept only when the
 * [`TextClassifier`] accepts their name.
 */

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use ignore::WalkBuilder;
use walkdir::WalkDir;

use crate::classifier::TextClassifier;
use crate::error::{ConcatError, Result};
use crate::policy::{normalize, PathPolicy};
use crate::tree::TreeIndex;
use crate::types::PathEntry;
use crate::utils::{file_name_of, DEFAULT_EXCLUDED_DIRS};

/// Default bound on recursion depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Traversal options
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Directory names skipped entirely
    pub excluded_dirs: HashSet<String>,
    /// Glob patterns matched against entry names; matches are hidden
    pub ignore_patterns: Vec<String>,
    /// Honour `.gitignore` files while listing
    pub respect_gitignore: bool,
    /// Maximum recursion depth below the listed directory
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Result of a walk: entries plus the number of excluded directories met
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<PathEntry>,
    pub skipped_dirs: usize,
}

/// A raw directory child before filtering
#[derive(Debug)]
struct Child {
    path: PathBuf,
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

/// Lists directories under a path policy
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    policy: PathPolicy,
    classifier: TextClassifier,
    options: WalkOptions,
}

impl DirectoryWalker {
    /// Create a new walker
    pub fn new(policy: PathPolicy, classifier: TextClassifier, options: WalkOptions) -> Self {
        Self {
            policy,
            classifier,
            options,
        }
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn classifier(&self) -> &TextClassifier {
        &self.classifier
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// List `dir`. Non-recursive mode returns immediate children with
    /// directories as unexpanded placeholders; recursive mode returns every
    /// text file beneath `dir`.
    pub fn list(&self, dir: &Path, recursive: bool) -> Result<Vec<PathEntry>> {
        Ok(self.walk(dir, recursive)?.entries)
    }

    /// Like [`list`](Self::list), also reporting skipped directories
    pub fn walk(&self, dir: &Path, recursive: bool) -> Result<Listing> {
        let dir = normalize(dir);
        let metadata = self.stat_allowed(&dir)?;

        if !metadata.is_dir() {
            // A file path lists as itself, if it is text
            let name = file_name_of(&dir);
            let entries = if self.classifier.is_text_file(&name) {
                vec![entry_for(&dir, name, false)]
            } else {
                Vec::new()
            };
            return Ok(Listing {
                entries,
                skipped_dirs: 0,
            });
        }

        let mut listing = Listing::default();
        if recursive {
            let mut visited = HashSet::new();
            visited.insert(canonical_or_self(&dir));
            self.walk_into(&dir, 0, &mut visited, &mut listing)?;
        } else {
            for child in self.filtered_children(&dir, &mut listing.skipped_dirs)? {
                listing
                    .entries
                    .push(entry_for(&child.path, child.name, child.is_dir));
            }
        }

        log::debug!(
            "Listed {} entries in {} (recursive: {}, skipped dirs: {})",
            listing.entries.len(),
            dir.display(),
            recursive,
            listing.skipped_dirs
        );
        Ok(listing)
    }

    /// Describe a single path after a policy check
    pub fn describe(&self, path: &Path) -> Result<PathEntry> {
        let path = normalize(path);
        let metadata = self.stat_allowed(&path)?;
        let name = file_name_of(&path);
        Ok(entry_for(&path, name, metadata.is_dir()))
    }

    /// Load the immediate children of `id` into `index` (lazy expansion)
    pub fn expand(&self, index: &mut TreeIndex, id: &str) -> Result<()> {
        let entries = self.list(Path::new(id), false)?;
        index.attach(id, entries)
    }

    /// Build a fully expanded index rooted at `root`
    pub fn build_tree(&self, root: &Path) -> Result<TreeIndex> {
        let root = normalize(root);
        let root_meta = self.stat_allowed(&root)?;
        if !root_meta.is_dir() {
            return Err(ConcatError::Validation(format!(
                "Root path is not a directory: {}",
                root.display()
            )));
        }

        let mut index = TreeIndex::new(&root);
        let mut visited = HashSet::new();
        visited.insert(canonical_or_self(&root));
        let mut pending = vec![(index.root_id().to_string(), 0usize)];

        while let Some((id, depth)) = pending.pop() {
            match self.expand(&mut index, &id) {
                Ok(()) => {}
                Err(e) if id != index.root_id() => {
                    log::warn!("Error processing directory {}: {}", id, e);
                    continue;
                }
                Err(e) => return Err(e),
            }
            if depth >= self.options.max_depth {
                log::warn!("Maximum depth reached below {}", id);
                continue;
            }
            for child in index.children(&id).iter().rev() {
                let is_dir = index.is_directory(child).unwrap_or(false);
                if is_dir && visited.insert(canonical_or_self(Path::new(child))) {
                    pending.push((child.clone(), depth + 1));
                }
            }
        }
        Ok(index)
    }

    /// Check the real location of `path`, with symlinks resolved, against
    /// the policy. The lexical check alone does not see where a link points.
    pub fn check_target(&self, path: &Path) -> Result<PathBuf> {
        let real = fs::canonicalize(path).map_err(|e| ConcatError::from_io(path, e))?;
        if !self.policy.is_allowed(&real) {
            log::debug!(
                "Blocked {}: resolves outside the allowed roots",
                path.display()
            );
            return Err(ConcatError::AccessDenied(path.to_path_buf()));
        }
        Ok(real)
    }

    fn stat_allowed(&self, path: &Path) -> Result<fs::Metadata> {
        if !self.policy.is_allowed(path) {
            return Err(ConcatError::AccessDenied(path.to_path_buf()));
        }
        self.check_target(path)?;
        fs::metadata(path).map_err(|e| ConcatError::from_io(path, e))
    }

    fn walk_into(
        &self,
        dir: &Path,
        depth: usize,
        visited: &mut HashSet<PathBuf>,
        listing: &mut Listing,
    ) -> Result<()> {
        let children = self.filtered_children(dir, &mut listing.skipped_dirs)?;

        for child in children {
            if !child.is_dir {
                listing
                    .entries
                    .push(entry_for(&child.path, child.name, false));
                continue;
            }

            if depth + 1 > self.options.max_depth {
                log::warn!("Maximum depth reached, not descending into {}", child.path.display());
                continue;
            }

            let real = match fs::canonicalize(&child.path) {
                Ok(real) => real,
                Err(e) => {
                    log::warn!("Cannot resolve directory {}: {}", child.path.display(), e);
                    continue;
                }
            };
            if !visited.insert(real) {
                log::debug!("Already visited, not descending into {}", child.path.display());
                continue;
            }

            if let Err(e) = self.walk_into(&child.path, depth + 1, visited, listing) {
                log::warn!("Error processing directory {}: {}", child.path.display(), e);
            }
        }
        Ok(())
    }

    /// Children of `dir` that pass names, policy, exclusion and text rules
    fn filtered_children(&self, dir: &Path, skipped_dirs: &mut usize) -> Result<Vec<Child>> {
        let mut kept = Vec::new();

        for child in self.read_children(dir)? {
            if self.should_ignore(&child.name) {
                continue;
            }
            if !self.policy.is_allowed(&child.path) {
                continue;
            }
            if child.is_symlink && !self.symlink_target_allowed(&child.path) {
                continue;
            }

            if child.is_dir {
                if self.options.excluded_dirs.contains(&child.name) {
                    *skipped_dirs += 1;
                    continue;
                }
                kept.push(child);
            } else if self.classifier.is_text_file(&child.name) {
                kept.push(child);
            }
        }

        // Directories first, each group in name order
        kept.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(kept)
    }

    /// Check whether an entry name matches a user ignore pattern
    pub fn should_ignore(&self, name: &str) -> bool {
        self.options
            .ignore_patterns
            .iter()
            .any(|pattern| glob_match(pattern, name))
    }

    fn symlink_target_allowed(&self, path: &Path) -> bool {
        match fs::canonicalize(path) {
            Ok(target) => self.policy.is_allowed(&target),
            Err(e) => {
                log::debug!("Dangling symlink {}: {}", path.display(), e);
                false
            }
        }
    }

    fn read_children(&self, dir: &Path) -> Result<Vec<Child>> {
        if self.options.respect_gitignore {
            self.read_children_gitignore(dir)
        } else {
            self.read_children_plain(dir)
        }
    }

    fn read_children_plain(&self, dir: &Path) -> Result<Vec<Child>> {
        let mut children = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_symlink = entry.path_is_symlink();
                    let is_dir = if is_symlink {
                        fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false)
                    } else {
                        entry.file_type().is_dir()
                    };
                    children.push(Child {
                        path: entry.path().to_path_buf(),
                        name: entry.file_name().to_string_lossy().to_string(),
                        is_dir,
                        is_symlink,
                    });
                }
                Err(e) if e.depth() == 0 => {
                    let source: io::Error = e.into();
                    return Err(ConcatError::from_io(dir, source));
                }
                Err(e) => {
                    log::warn!("Error reading entry in {}: {}", dir.display(), e);
                }
            }
        }
        Ok(children)
    }

    fn read_children_gitignore(&self, dir: &Path) -> Result<Vec<Child>> {
        // Surface errors on the directory itself with their real kind
        fs::read_dir(dir).map_err(|e| ConcatError::from_io(dir, e))?;

        let mut builder = WalkBuilder::new(dir);
        builder
            .max_depth(Some(1))
            .hidden(false)
            .follow_links(false)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut children = Vec::new();
        for entry in builder.build() {
            match entry {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        continue;
                    }
                    let is_symlink = entry.path_is_symlink();
                    let is_dir = if is_symlink {
                        fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false)
                    } else {
                        entry.file_type().is_some_and(|ft| ft.is_dir())
                    };
                    children.push(Child {
                        path: entry.path().to_path_buf(),
                        name: entry.file_name().to_string_lossy().to_string(),
                        is_dir,
                        is_symlink,
                    });
                }
                Err(e) => {
                    log::warn!("Error reading entry in {}: {}", dir.display(), e);
                }
            }
        }
        Ok(children)
    }
}

fn entry_for(path: &Path, name: String, is_directory: bool) -> PathEntry {
    PathEntry {
        id: path.to_string_lossy().to_string(),
        name,
        is_directory,
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
