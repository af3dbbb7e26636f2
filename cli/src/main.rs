mod dashboard;
mod logging;
mod report;
mod track;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use codetime_core::{parse_duration, CodeTime, Config, FileDescriptor, StatusText};

#[derive(Parser)]
#[command(name = "codetime")]
#[command(about = "Measures active coding time per language, file and hour", long_about = None)]
#[command(version)]
struct Cli {
    /// Storage root (default: $CODETIME_HOME or ~/.codetime)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show time coded today (default)
    Today,
    /// Print a rollup over the most recent days
    Stats {
        /// Number of days including today
        #[arg(short, long, default_value_t = 30)]
        days: usize,
        /// Emit the rollup as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the terminal dashboard
    Dashboard {
        #[arg(short, long, default_value_t = 7)]
        days: usize,
    },
    /// Delete all recorded time
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Track editor events read as JSON lines from stdin
    Track {
        /// File already open in the editor
        #[arg(long, value_name = "PATH")]
        file: Option<String>,
        /// Language identifier of --file
        #[arg(long, requires = "file")]
        language: Option<String>,
        /// Gap after which activity counts as idle (e.g. 5m)
        #[arg(long, value_parser = parse_duration_arg)]
        idle_threshold: Option<Duration>,
        #[arg(long, value_parser = parse_duration_arg)]
        idle_check_interval: Option<Duration>,
        #[arg(long, value_parser = parse_duration_arg)]
        status_interval: Option<Duration>,
    },
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = match cli.data_dir {
        Some(dir) => Config::with_root(dir),
        None => Config::from_env()?,
    };

    match cli.command.unwrap_or(Commands::Today) {
        Commands::Today => {
            let app = CodeTime::open(config)?;
            let status = StatusText::from_record(&app.today_stats());
            println!("{}", status.text);
            println!("{}", status.tooltip);
        }
        Commands::Stats { days, json } => {
            let app = CodeTime::open(config)?;
            let stats = app.stats(days);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                report::show_stats(&stats, days);
            }
        }
        Commands::Dashboard { days } => {
            let app = CodeTime::open(config)?;
            dashboard::run(&app, days)?;
        }
        Commands::Reset { yes } => {
            if !yes && !confirm("Delete all recorded coding time?")? {
                println!("Aborted.");
                return Ok(());
            }
            let app = CodeTime::open(config)?;
            if app.reset_stats() {
                println!("All coding time statistics have been reset.");
            } else {
                anyhow::bail!("Failed to reset statistics");
            }
        }
        Commands::Track {
            file,
            language,
            idle_threshold,
            idle_check_interval,
            status_interval,
        } => {
            if let Some(v) = idle_threshold {
                config.idle_threshold = v;
            }
            if let Some(v) = idle_check_interval {
                config.idle_check_interval = v;
            }
            if let Some(v) = status_interval {
                config.status_refresh_interval = v;
            }
            let active_file =
                file.map(|name| FileDescriptor::new(name, language.unwrap_or_default()));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(track::run(config, active_file))?;
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
