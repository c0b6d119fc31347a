use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{info, LevelFilter};

use kinergy::batch::{confirm_batch_size, discover_trials, jobs_from_filenames, run_batch};
use kinergy::config::PipelineConfig;
use kinergy::output::write_energy_files;

#[derive(Parser)]
#[command(name = "kinergy")]
#[command(about = "Convert inertial-sensor trial recordings into energy curves")]
struct Cli {
    /// Directory containing the trial CSV files
    input: PathBuf,

    /// Configuration file (TOML); defaults apply when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output directory override
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Worker count override
    #[arg(long, short)]
    workers: Option<usize>,

    /// Proceed without asking on a suboptimal batch size
    #[arg(long, short = 'y')]
    yes: bool,
}

fn main() -> Result<()> {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();

    let args = Cli::parse();
    let mut config = PipelineConfig::load_or_default(args.config.as_deref())?;
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    if let Some(workers) = args.workers {
        config.main.workers = workers;
    }
    config.validate()?;

    let jobs = if config.main.filenames_auto {
        discover_trials(&args.input, &config.main.names)?
    } else {
        jobs_from_filenames(&args.input, &config.main.filenames)?
    };
    info!("{} trial(s) scheduled", jobs.len());

    if jobs.len() < config.main.workers && !args.yes {
        let stdin = std::io::stdin();
        let mut lock = stdin.lock();
        if !confirm_batch_size(jobs.len(), config.main.workers, &mut lock)? {
            info!("aborted at the batch-size prompt");
            return Ok(());
        }
    }

    let aggregator = run_batch(&jobs, &config)?;
    let written = write_energy_files(&aggregator, &config.output)?;
    for path in written {
        info!("wrote {}", path.display());
    }
    Ok(())
}
