/*!
 * Command-line interface for concatfs
 */

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;

use concatfs::config::{Args, Config, Mode};
use concatfs::engine::ConcatenationEngine;
use concatfs::report::{ReportFormat, Reporter, RunReport};
use concatfs::selection::{SelectionResolver, SelectionSet};
use concatfs::service::{FileService, ListDirectoryRequest};
use concatfs::tokenizer::{BpeTokenizer, Tokenizer};
use concatfs::tree::TreeIndex;
use concatfs::{ConcatError, Result};

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "concatfs", &mut io::stdout());
        return;
    }

    setup_logging(args.quiet, args.verbose);

    let config = Config::from_args(args);
    if let Err(e) = run(&config) {
        log::debug!("Run failed: {:?}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run(config: &Config) -> Result<()> {
    // Validate configuration
    config.validate()?;

    // Configure thread pool
    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        log::warn!("Failed to set thread pool size: {}", e);
    }

    let service = FileService::new(config.walker());
    let root = config.root_path();

    match config.mode {
        Mode::List { recursive } => {
            let request = ListDirectoryRequest {
                path: root.to_string_lossy().to_string(),
                recursive,
            };
            let response = service.list_directory(&request);
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.success {
                Ok(())
            } else {
                process::exit(1);
            }
        }
        Mode::Tree => {
            let index = service.walker().build_tree(&root)?;
            print!("{}", index.render());
            Ok(())
        }
        Mode::Concatenate => concatenate(config, &service, &root),
    }
}

fn concatenate(config: &Config, service: &FileService, root: &Path) -> Result<()> {
    let start_time = Instant::now();

    // Resolve selection into a flat file list
    let selection = SelectionSet::from_ids(config.selection_ids());
    let index = TreeIndex::new(root);
    let mut resolution = SelectionResolver::new(service.walker()).resolve(&selection, &index)?;

    // A previous run's document must not feed into this one
    if let Some(output) = config.output_path() {
        if resolution.exclude(&output) {
            log::info!("Leaving existing output {} out of the document", output.display());
        }
    }

    if resolution.is_empty() {
        return Err(ConcatError::Validation(
            "No text files found in the selection; please select at least one file".to_string(),
        ));
    }

    // Create progress bar
    let progress = if config.to_stdout {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(resolution.len() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%)",
            )
            .map_err(|e| ConcatError::Config(e.to_string()))?,
    );
    progress.set_prefix("📊 Concatenating");
    progress.enable_steady_tick(std::time::Duration::from_millis(100));

    let engine = ConcatenationEngine::new(
        service.walker().classifier().clone(),
        Arc::new(progress.clone()),
    )?;
    let result = engine.concatenate_resolution(&resolution, service, root);
    progress.finish_and_clear();

    let output = if config.to_stdout {
        io::stdout().write_all(result.content.as_bytes())?;
        "<stdout>".to_string()
    } else {
        fs::write(&config.output_file, &result.content)?;
        config.output_file.display().to_string()
    };

    let exact_tokens = match config.model {
        Some(model) => {
            let tokenizer = BpeTokenizer::new(model)?;
            Some((tokenizer.count_tokens(&result.content), model.name().to_string()))
        }
        None => None,
    };

    let report = RunReport {
        output,
        duration: start_time.elapsed(),
        stats: result.stats,
        files: result.files,
        exact_tokens,
    };

    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    if config.to_stdout {
        reporter.eprint_report(&report);
    } else {
        reporter.print_report(&report);
    }

    Ok(())
}
