/*!
 * concatfs - Concatenate selected text files into one Markdown document
 *
 * This library lists the text files of a directory under a path policy,
 * resolves a selection of files and directories into a flat file list,
 * and concatenates them into a Markdown document with a table of
 * contents, fenced sections and masked secrets, for use as context for
 * Large Language Models.
 */

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod report;
pub mod selection;
pub mod service;
pub mod tokenizer;
pub mod tree;
pub mod types;
pub mod utils;
pub mod walker;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use classifier::{ClassifierTables, TextClassifier};
pub use config::Config;
pub use engine::{ConcatenationEngine, ContentProvider, EnvMasker};
pub use error::{ConcatError, ErrorKind, Result};
pub use policy::{PathPolicy, PolicyRules};
pub use report::{ReportFormat, Reporter, RunReport};
pub use selection::{Resolution, SelectionResolver, SelectionSet};
pub use service::FileService;
pub use tree::TreeIndex;
pub use types::{ConcatenationResult, PathEntry, ProcessingStats, TreeNode};
pub use walker::{DirectoryWalker, WalkOptions};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
