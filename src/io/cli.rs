//! Command-line interface for batch analysis of prompt session files

use crate::analysis::config::AnalysisConfig;
use crate::analysis::session::SessionAnalyzer;
use crate::io::configuration::{
    DEFAULT_CLUSTER_THRESHOLD, DEFAULT_MAX_PAIR_DISTANCE, SESSION_EXTENSION,
};
use crate::io::error::{Result, file_system, invalid_parameter};
use crate::io::progress::ProgressManager;
use crate::io::session::{is_output_path, output_path, read_session, write_analysis};
use clap::Parser;
use log::{LevelFilter, error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "prompt-evolution")]
#[command(
    author,
    version,
    about = "Trace word lineage, image clusters and change graphs of prompt sessions"
)]
/// Command-line arguments for the session analysis tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Session JSON file or directory of session files
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Ward distance at which image clusters are cut
    #[arg(short, long, default_value_t = DEFAULT_CLUSTER_THRESHOLD)]
    pub threshold: f64,

    /// Maximum number of changed words for two prompts to be compared
    #[arg(short = 'd', long, default_value_t = DEFAULT_MAX_PAIR_DISTANCE)]
    pub max_distance: usize,

    /// Orient edges from lower to higher cluster before bundling
    #[arg(short, long)]
    pub canonical_direction: bool,

    /// Keep common stop words in the change graph
    #[arg(short, long)]
    pub keep_stopwords: bool,

    /// Suppress progress output and warnings
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log per-step detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Process files even if output exists
    #[arg(short, long)]
    pub no_skip: bool,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Log level forced by the flags, if any
    pub const fn log_level(&self) -> Option<LevelFilter> {
        if self.quiet {
            Some(LevelFilter::Error)
        } else if self.verbose {
            Some(LevelFilter::Debug)
        } else {
            None
        }
    }

    /// Analysis parameters selected by the flags
    pub fn analysis_config(&self) -> AnalysisConfig {
        let defaults = AnalysisConfig::default();
        AnalysisConfig {
            cluster_threshold: self.threshold,
            max_pair_distance: self.max_distance,
            ignored_words: if self.keep_stopwords {
                Vec::new()
            } else {
                defaults.ignored_words
            },
            canonical_direction: self.canonical_direction,
            symbols: defaults.symbols,
        }
    }
}

/// Install the stderr logger, `warn` unless `RUST_LOG` or the flags say otherwise
pub fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = cli.log_level() {
        builder.filter_level(level);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Orchestrates batch analysis of session files with progress tracking
pub struct FileProcessor {
    cli: Cli,
    analyzer: SessionAnalyzer,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the flags give an invalid configuration
    pub fn new(cli: Cli) -> Result<Self> {
        let analyzer = SessionAnalyzer::new(cli.analysis_config())?;
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Ok(Self {
            cli,
            analyzer,
            progress_manager,
        })
    }

    /// Process files according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if target validation or file processing fails
    pub fn process(&mut self) -> Result<()> {
        let files = self.collect_files()?;

        if files.is_empty() {
            info!("No session files to analyze");
            return Ok(());
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        for (index, file) in files.iter().enumerate() {
            if let Err(err) = self.process_file(file, index) {
                error!("Failed to analyze {}: {err}", file.display());
                if let Some(ref mut pm) = self.progress_manager {
                    pm.fail_file(index, &err.to_string());
                    pm.finish();
                }
                return Err(err);
            }
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    /// Analyze one session file and write its analysis next to it
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or analyzed, or the
    /// analysis cannot be written
    pub fn process_file(&mut self, input_path: &Path, index: usize) -> Result<()> {
        let start_time = Instant::now();

        if let Some(ref mut pm) = self.progress_manager {
            pm.start_file(index, input_path);
        }

        let session = read_session(input_path)?;
        let analysis = self.analyzer.analyze(&session)?;
        let output = output_path(input_path);
        write_analysis(&output, &analysis)?;
        info!("Wrote {}", output.display());

        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_file(index, start_time.elapsed());
        }

        Ok(())
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;

        if target.is_file() {
            if !is_session_file(target) {
                return Err(invalid_parameter(
                    "target",
                    &target.display(),
                    &"Target file must be a JSON session file",
                ));
            }
            Ok(if self.should_process_file(target) {
                vec![target.clone()]
            } else {
                vec![]
            })
        } else if target.is_dir() {
            let mut files = Vec::new();
            let entries = std::fs::read_dir(target).map_err(file_system(target, "list"))?;
            for entry in entries {
                let path = entry.map_err(file_system(target, "list"))?.path();
                if is_session_file(&path) && !is_output_path(&path) && self.should_process_file(&path)
                {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(invalid_parameter(
                "target",
                &target.display(),
                &"Target must be a JSON session file or directory",
            ))
        }
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        if output_path(input_path).exists() {
            // Allow print for user feedback for progress messages
            #[allow(clippy::print_stderr)]
            if !self.cli.quiet {
                eprintln!("Skipping: {} (output exists)", input_path.display());
            }
            false
        } else {
            true
        }
    }
}

fn is_session_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(SESSION_EXTENSION)
}
