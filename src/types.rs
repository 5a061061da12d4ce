/*!
 * Core types and data structures for concatfs
 */

use serde::{Deserialize, Serialize};

/// A discoverable filesystem entry. Identity is the absolute path in `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    /// Absolute path
    pub id: String,
    /// Final path component
    pub name: String,
    /// Whether the entry is a directory
    pub is_directory: bool,
}

/// A [`PathEntry`] with its children, for display and serialization.
///
/// `children` is `None` for files and for directories that have not been
/// expanded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub entry: PathEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

/// Counters for one concatenation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    /// Files whose content made it into the document
    pub processed_files: usize,
    /// Files skipped because of a binary extension
    pub ignored_files: usize,
    /// Excluded directories met while expanding directory selections
    pub skipped_dirs: usize,
    /// Files that failed to read
    pub errors: usize,
    /// Sum of `ceil(chars / 4)` over processed files
    pub total_tokens: usize,
}

/// Outcome of a single file inside a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Content included
    Processed {
        /// Number of lines
        lines: usize,
        /// Number of characters
        chars: usize,
        /// Estimated tokens
        tokens: usize,
    },
    /// Skipped for its extension, never fetched
    Ignored,
    /// Fetch failed
    Failed(String),
}

/// Per-file record of a run, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the root, as shown in the document
    pub relative_path: String,
    /// What happened to the file
    pub outcome: FileOutcome,
}

/// The produced document plus its statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatenationResult {
    /// Markdown document
    pub content: String,
    /// Final counters
    pub stats: ProcessingStats,
    /// Per-file outcomes in document order
    pub files: Vec<FileRecord>,
}
