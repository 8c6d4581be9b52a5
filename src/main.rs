//! CLI entry point for prompt session analysis

use clap::Parser;
use prompt_evolution::io::cli::{Cli, FileProcessor, init_logging};

fn main() -> prompt_evolution::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut processor = FileProcessor::new(cli)?;
    processor.process()
}
