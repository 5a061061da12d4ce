/*!
 * Markdown concatenation
 *
 * Builds the single output document: preamble, numbered table of
 * contents, one fenced section per file, and a statistics footer.
 * Files are fetched one at a time in input order.
 */

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use regex::{Captures, Regex};

use crate::classifier::TextClassifier;
use crate::error::Result;
use crate::selection::Resolution;
use crate::tokenizer::estimate_tokens;
use crate::types::{ConcatenationResult, FileOutcome, FileRecord, ProcessingStats};
use crate::utils::{file_name_of, format_with_commas, relative_display, DEFAULT_MASKED_KEY_TERMS};

/// Default file name for the produced document
pub const DEFAULT_OUTPUT_NAME: &str = "concatenated-files.md";

const PREAMBLE: &str = "# This is one large file that contains many files concatenated together.  The file starts with a Table of Contents for this file, which lists every file in that was concatenated along with the file paths.  The table of contents ends with \"----\", after which you will find the actual file contents, with each file starting with \"## File {#}\":\n\n";

const CURSORRULES_NOTE: &str = "### This file describes the overall scope and intent of the codebase";

/// Source of file contents, one call per file
pub trait ContentProvider {
    fn fetch(&self, path: &Path) -> Result<String>;
}

impl<F> ContentProvider for F
where
    F: Fn(&Path) -> Result<String>,
{
    fn fetch(&self, path: &Path) -> Result<String> {
        self(path)
    }
}

/// Redacts sensitive values in env-style `KEY=VALUE` lines
#[derive(Debug, Clone)]
pub struct EnvMasker {
    line: Regex,
    key_terms: Vec<String>,
}

impl EnvMasker {
    /// Marker written in place of a masked value
    pub const MARKER: &'static str = "[MASKED]";

    pub fn new(key_terms: Vec<String>) -> Result<Self> {
        let line = Regex::new(
            r"(?mR)^([ \t]*(?:export[ \t]+)?)([A-Za-z0-9_]+)[ \t]*[= \t][ \t]*(.*)$",
        )?;
        let key_terms = key_terms.into_iter().map(|t| t.to_lowercase()).collect();
        Ok(Self { line, key_terms })
    }

    /// Whether `name` looks like an environment file
    pub fn is_env_file(name: &str) -> bool {
        name == ".env" || name.ends_with(".env") || name.contains(".env.")
    }

    /// Mask values whose key contains a sensitive term. Everything after
    /// the separator is replaced, quotes and trailing comments included.
    pub fn mask<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.line.replace_all(content, |caps: &Captures| {
            let key = &caps[2];
            if caps[3].trim().is_empty() || !self.is_sensitive_key(key) {
                return caps[0].to_string();
            }
            format!("{}{}={}", &caps[1], key, Self::MARKER)
        })
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.key_terms.iter().any(|term| lower.contains(term.as_str()))
    }
}

/// Builds the concatenated Markdown document
pub struct ConcatenationEngine {
    classifier: TextClassifier,
    masker: EnvMasker,
    progress: Arc<ProgressBar>,
}

impl ConcatenationEngine {
    /// Create an engine with the default masking terms
    pub fn new(classifier: TextClassifier, progress: Arc<ProgressBar>) -> Result<Self> {
        let terms = DEFAULT_MASKED_KEY_TERMS.iter().map(|s| s.to_string()).collect();
        let masker = EnvMasker::new(terms)?;
        Ok(Self::with_masker(classifier, masker, progress))
    }

    pub fn with_masker(
        classifier: TextClassifier,
        masker: EnvMasker,
        progress: Arc<ProgressBar>,
    ) -> Self {
        Self {
            classifier,
            masker,
            progress,
        }
    }

    /// Concatenate a resolved selection, carrying its skipped-directory count
    pub fn concatenate_resolution<P>(
        &self,
        resolution: &Resolution,
        provider: &P,
        root: &Path,
    ) -> ConcatenationResult
    where
        P: ContentProvider + ?Sized,
    {
        let stats = ProcessingStats {
            skipped_dirs: resolution.skipped_dirs,
            ..ProcessingStats::default()
        };
        self.run(&resolution.files, provider, root, stats)
    }

    /// Concatenate `files` in order. Individual file failures are counted,
    /// never raised; an empty list yields a minimal document.
    pub fn concatenate<P>(
        &self,
        files: &[PathBuf],
        provider: &P,
        root: &Path,
    ) -> ConcatenationResult
    where
        P: ContentProvider + ?Sized,
    {
        self.run(files, provider, root, ProcessingStats::default())
    }

    fn run<P>(
        &self,
        files: &[PathBuf],
        provider: &P,
        root: &Path,
        mut stats: ProcessingStats,
    ) -> ConcatenationResult
    where
        P: ContentProvider + ?Sized,
    {
        let relative: Vec<String> = files.iter().map(|f| relative_display(f, root)).collect();
        let mut doc = String::from(PREAMBLE);
        let mut records = Vec::with_capacity(files.len());

        for (i, rel) in relative.iter().enumerate() {
            let _ = writeln!(doc, "{}. [{}](#file-{})", i + 1, rel, i + 1);
        }
        doc.push_str("\n---\n\n");

        for (i, (path, rel)) in files.iter().zip(&relative).enumerate() {
            let number = i + 1;
            let name = file_name_of(path);
            self.progress.inc(1);
            self.progress.set_message(format!("Current file: {}", name));

            let _ = write!(doc, "## File {}: `{}`", number, rel);
            if name == ".cursorrules" {
                doc.push_str(" (Cursorrules)");
                let _ = write!(doc, "\n\n{}", CURSORRULES_NOTE);
            }
            doc.push_str("\n\n");

            let outcome = if self.classifier.is_binary(&name) {
                stats.ignored_files += 1;
                doc.push_str("*Skipped: binary file type*\n");
                FileOutcome::Ignored
            } else {
                match provider.fetch(path) {
                    Ok(content) => {
                        let content = if EnvMasker::is_env_file(&name) {
                            self.masker.mask(&content).into_owned()
                        } else {
                            content
                        };
                        self.write_fenced(&mut doc, &name, &content);

                        let tokens = estimate_tokens(&content);
                        stats.processed_files += 1;
                        stats.total_tokens += tokens;
                        FileOutcome::Processed {
                            lines: content.lines().count(),
                            chars: content.chars().count(),
                            tokens,
                        }
                    }
                    Err(e) => {
                        log::warn!("Error processing file {}: {}", path.display(), e);
                        stats.errors += 1;
                        let _ = writeln!(doc, "*[Error reading file: {}]*", e);
                        FileOutcome::Failed(e.to_string())
                    }
                }
            };
            doc.push_str("\n---\n\n");

            records.push(FileRecord {
                relative_path: rel.clone(),
                outcome,
            });
        }

        write_statistics(&mut doc, &stats);

        log::info!(
            "Concatenated {} files ({} ignored, {} errors, ~{} tokens)",
            stats.processed_files,
            stats.ignored_files,
            stats.errors,
            stats.total_tokens
        );

        ConcatenationResult {
            content: doc,
            stats,
            files: records,
        }
    }

    fn write_fenced(&self, doc: &mut String, name: &str, content: &str) {
        let _ = writeln!(doc, "```{}", self.classifier.fence_language(name));
        doc.push_str(content);
        if !content.ends_with('\n') {
            doc.push('\n');
        }
        doc.push_str("```\n");
    }
}

fn write_statistics(doc: &mut String, stats: &ProcessingStats) {
    doc.push_str("## Processing Statistics\n\n");
    let _ = writeln!(doc, "- Files processed: {}", stats.processed_files);
    let _ = writeln!(doc, "- Files ignored: {}", stats.ignored_files);
    let _ = writeln!(doc, "- Directories skipped: {}", stats.skipped_dirs);
    let _ = writeln!(doc, "- Errors encountered: {}", stats.errors);
    let _ = writeln!(doc, "- Estimated tokens: {}", format_with_commas(stats.total_tokens));
}
