/*!
 * Configuration handling for concatfs
 */

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;

use crate::classifier::{ClassifierTables, TextClassifier};
use crate::engine::DEFAULT_OUTPUT_NAME;
use crate::error::{ConcatError, Result};
use crate::policy::{normalize, PathPolicy, PolicyRules};
use crate::tokenizer::Model;
use crate::walker::{DirectoryWalker, WalkOptions, DEFAULT_MAX_DEPTH};
use crate::{bail, ensure};

/// Command-line arguments for concatfs
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "concatfs",
    version = env!("CARGO_PKG_VERSION"),
    about = "Concatenate selected text files into a single Markdown document",
    long_about = "Lists the text files of a directory and concatenates a selection of them into one Markdown document with a table of contents, language-tagged code fences and masked secrets, for use as context for Large Language Models (LLMs)."
)]
pub struct Args {
    /// Root directory to browse
    #[clap(default_value = ".")]
    pub root: String,

    /// Output Markdown file name
    #[clap(default_value = DEFAULT_OUTPUT_NAME)]
    pub output_file: String,

    /// Comma-separated files or directories to concatenate (absolute or root-relative); defaults to the whole root
    #[clap(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Comma-separated list of allowed root prefixes (defaults to the root directory)
    #[clap(long, value_delimiter = ',')]
    pub allow_root: Vec<String>,

    /// Comma-separated list of extra directory names to exclude
    #[clap(long, value_delimiter = ',')]
    pub exclude_dir: Vec<String>,

    /// Comma-separated list of glob patterns; matching entry names are hidden
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Respect .gitignore files while listing
    #[clap(long)]
    pub respect_gitignore: bool,

    /// Maximum recursion depth below a listed directory
    #[clap(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Number of threads used to expand directory selections
    #[clap(long, default_value = "4")]
    pub threads: usize,

    /// Print a list-directory response (JSON) for the root instead of concatenating
    #[clap(long)]
    pub list: bool,

    /// With --list, list every text file beneath the root
    #[clap(long, requires = "list")]
    pub recursive: bool,

    /// Print the directory tree of the root instead of concatenating
    #[clap(long, conflicts_with = "list")]
    pub tree: bool,

    /// Write the document to stdout instead of the output file
    #[clap(long)]
    pub stdout: bool,

    /// Count tokens exactly with this encoding in the final report
    #[clap(long, value_enum)]
    pub model: Option<Model>,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Silence all logging
    #[clap(short, long)]
    pub quiet: bool,
}

/// What the binary should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Concatenate the selection into a document
    Concatenate,
    /// Print a list-directory response
    List { recursive: bool },
    /// Print the directory tree
    Tree,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory
    pub root: PathBuf,

    /// Output Markdown file path
    pub output_file: PathBuf,

    /// Selected paths, absolute; empty means the whole root
    pub selected: Vec<PathBuf>,

    /// Allow-listed root prefixes; empty means the root itself
    pub allowed_roots: Vec<PathBuf>,

    /// Extra excluded directory names
    pub exclude_dirs: Vec<String>,

    /// Glob patterns hiding entries by name
    pub ignore_patterns: Vec<String>,

    /// Whether to respect .gitignore files
    pub respect_gitignore: bool,

    /// Maximum recursion depth
    pub max_depth: usize,

    /// Number of threads to use for resolving selections
    pub num_threads: usize,

    /// Operation to run
    pub mode: Mode,

    /// Write the document to stdout
    pub to_stdout: bool,

    /// Encoding for exact token counting
    pub model: Option<Model>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        let root = PathBuf::from(args.root.trim());
        let selected = args
            .select
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                let p = PathBuf::from(s);
                if p.is_absolute() {
                    p
                } else {
                    root.join(p)
                }
            })
            .collect();
        let mode = if args.list {
            Mode::List {
                recursive: args.recursive,
            }
        } else if args.tree {
            Mode::Tree
        } else {
            Mode::Concatenate
        };

        Self {
            root,
            output_file: PathBuf::from(args.output_file),
            selected,
            allowed_roots: args.allow_root.into_iter().map(PathBuf::from).collect(),
            exclude_dirs: args.exclude_dir,
            ignore_patterns: args.ignore_patterns,
            respect_gitignore: args.respect_gitignore,
            max_depth: args.max_depth,
            num_threads: args.threads,
            mode,
            to_stdout: args.stdout,
            model: args.model,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.root.as_os_str().is_empty(),
            Validation,
            "Please enter a valid root directory path"
        );

        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => bail!(
                Validation,
                "Root path is not a directory: {}",
                self.root.display()
            ),
            Err(e) => return Err(ConcatError::from_io(&self.root, e)),
        }

        if self.mode == Mode::Concatenate && !self.to_stdout {
            if let Some(parent) = self.output_file.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    bail!(
                        Config,
                        "Output directory not found: {}",
                        parent.display()
                    );
                }
            }
        }

        ensure!(self.num_threads > 0, Config, "Thread count must be positive");
        Ok(())
    }

    /// Absolute, normalized root
    pub fn root_path(&self) -> PathBuf {
        fs::canonicalize(&self.root).unwrap_or_else(|_| normalize(&self.root))
    }

    /// Resolved location of the output file, when the document goes to one
    pub fn output_path(&self) -> Option<PathBuf> {
        if self.to_stdout {
            None
        } else {
            Some(absolute(&self.output_file))
        }
    }

    /// Selection ids; the root itself when nothing was selected
    pub fn selection_ids(&self) -> Vec<String> {
        if self.selected.is_empty() {
            vec![self.root_path().to_string_lossy().to_string()]
        } else {
            self.selected
                .iter()
                .map(|p| absolute(p).to_string_lossy().to_string())
                .collect()
        }
    }

    /// Path policy from the allow-list, or the root when none was given
    pub fn policy(&self) -> PathPolicy {
        let roots = if self.allowed_roots.is_empty() {
            vec![self.root_path()]
        } else {
            self.allowed_roots.iter().map(|p| absolute(p)).collect()
        };
        PathPolicy::new(PolicyRules::default(), roots)
    }

    /// Walker options with the configured additions
    pub fn walk_options(&self) -> WalkOptions {
        let mut options = WalkOptions {
            ignore_patterns: self.ignore_patterns.clone(),
            respect_gitignore: self.respect_gitignore,
            max_depth: self.max_depth,
            ..WalkOptions::default()
        };
        let extra: HashSet<String> = self
            .exclude_dirs
            .iter()
            .map(|d| d.trim().trim_matches('/').to_string())
            .filter(|d| !d.is_empty())
            .collect();
        options.excluded_dirs.extend(extra);
        options
    }

    /// Walker wired with this configuration
    pub fn walker(&self) -> DirectoryWalker {
        DirectoryWalker::new(
            self.policy(),
            TextClassifier::new(ClassifierTables::default()),
            self.walk_options(),
        )
    }
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
}
