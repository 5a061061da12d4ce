/*!
 * Reporting functionality for concatfs
 *
 * Renders the outcome of a concatenation run as console tables
 * using the tabled library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::{FileOutcome, FileRecord, ProcessingStats};
use crate::utils::format_number;

/// Number of files listed before the table is cut down to the largest ones
const MAX_LISTED_FILES: usize = 15;

/// Everything needed to describe a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Where the document went
    pub output: String,
    /// Time taken to resolve and concatenate
    pub duration: Duration,
    /// Final counters
    pub stats: ProcessingStats,
    /// Per-file outcomes in document order
    pub files: Vec<FileRecord>,
    /// Exact token count of the document and the encoding used
    pub exact_tokens: Option<(usize, String)>,
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for run results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &RunReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &RunReport) {
        println!("\n{}", self.generate_report(report));
    }

    /// Print the report to stderr, for when stdout carries the document
    pub fn eprint_report(&self, report: &RunReport) {
        eprintln!("\n{}", self.generate_report(report));
    }

    // Keep the tail of long paths, which carries the file name
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.len() <= max_len {
            return path.to_string();
        }

        let parts: Vec<&str> = path.split('/').collect();
        let mut segments = Vec::new();
        let mut current_len = 3; // "..."
        for part in parts.iter().rev() {
            let part_len = part.len() + 1;
            if current_len + part_len <= max_len {
                segments.push(*part);
                current_len += part_len;
            } else {
                break;
            }
        }

        if segments.is_empty() {
            let tail: String = path
                .chars()
                .rev()
                .take(max_len.saturating_sub(3))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return format!("...{}", tail);
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn create_summary_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let stats = &report.stats;
        let mut rows = vec![
            SummaryRow {
                key: "📂 Output".to_string(),
                value: report.output.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Files Processed".to_string(),
                value: format_number(stats.processed_files),
            },
            SummaryRow {
                key: "🚫 Files Ignored".to_string(),
                value: format_number(stats.ignored_files),
            },
            SummaryRow {
                key: "⏩ Directories Skipped".to_string(),
                value: format_number(stats.skipped_dirs),
            },
            SummaryRow {
                key: "⚠️ Errors".to_string(),
                value: format_number(stats.errors),
            },
        ];

        let token_text = match &report.exact_tokens {
            Some((tokens, encoding)) => {
                format!("{} tokens (counted, {})", format_number(*tokens), encoding)
            }
            None => format!("{} tokens (estimated)", format_number(stats.total_tokens)),
        };
        rows.push(SummaryRow {
            key: "📦 LLM Tokens".to_string(),
            value: token_text,
        });

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Status")]
            status: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,
        }

        let mut files: Vec<&FileRecord> = report.files.iter().collect();
        if files.len() > MAX_LISTED_FILES {
            files.sort_by_key(|f| std::cmp::Reverse(chars_of(f)));
            files.truncate(10);
        }

        let rows: Vec<FileRow> = files
            .iter()
            .map(|record| {
                let (status, lines, tokens) = match &record.outcome {
                    FileOutcome::Processed { lines, tokens, .. } => (
                        "included".to_string(),
                        format_number(*lines),
                        format_number(*tokens),
                    ),
                    FileOutcome::Ignored => ("ignored".to_string(), "-".into(), "-".into()),
                    FileOutcome::Failed(_) => ("error".to_string(), "-".into(), "-".into()),
                };
                FileRow {
                    path: self.format_path(&record.relative_path, 60),
                    status,
                    lines,
                    tokens,
                }
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &RunReport) -> String {
        let summary_table = self.create_summary_table(report);
        let files_table = self.create_files_table(report);

        let summary_title = "✅  CONCATENATION COMPLETE";
        let files_title = if report.files.len() > MAX_LISTED_FILES {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  CONCATENATED FILES"
        };

        format!(
            "{}\n{}\n\n{}\n{}",
            files_title, files_table, summary_title, summary_table
        )
    }
}

fn chars_of(record: &FileRecord) -> usize {
    match record.outcome {
        FileOutcome::Processed { chars, .. } => chars,
        _ => 0,
    }
}
