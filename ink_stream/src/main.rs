use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ink_stream::{PipelineConfig, ReplayCase, ReplayRunner};

/// Replay recorded strokes and check that batching does not change the result
#[derive(Parser)]
#[command(name = "ink-replay", version)]
struct Cli {
    /// Replay case files (JSON)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Pipeline config to use instead of each case's own
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for SVG output
    #[arg(long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Extra event offset to split delivery at (repeatable)
    #[arg(long = "split")]
    splits: Vec<usize>,

    /// Print the smoothed points of every line
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = std::fs::create_dir_all(&cli.output_dir) {
        eprintln!("Cannot create {}: {e}", cli.output_dir.display());
        return ExitCode::FAILURE;
    }

    let mut runner = ReplayRunner::new(cli.verbose, Some(cli.output_dir.clone())).with_splits(cli.splits);
    if let Some(path) = &cli.config {
        match PipelineConfig::from_file(path) {
            Ok(config) => runner = runner.with_config(config),
            Err(e) => {
                eprintln!("Config error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let mut failed = 0;
    for file in &cli.files {
        let result = ReplayCase::from_file(file).and_then(|case| runner.run(&case));
        if let Err(e) = result {
            eprintln!("✗ {}: {e}", file.display());
            failed += 1;
        }
    }

    println!("\n{} of {} replays passed", cli.files.len() - failed, cli.files.len());
    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
