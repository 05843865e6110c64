use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod shell;

#[derive(Parser)]
#[command(name = "cronobat", version, about = "Cronobat focus timer")]
struct Cli {
    /// Config file (defaults to ~/.config/cronobat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live session until it ends or Ctrl-C
    Run(commands::session::RunArgs),
    /// Run a session on a virtual clock and print its events as JSON lines
    Simulate(commands::session::SimulateArgs),
    /// Format seconds as MM:SS or HH:MM:SS
    Format {
        seconds: u64,
    },
    /// Parse MM:SS or HH:MM:SS into seconds
    Parse {
        clock: String,
    },
    /// Configuration inspection
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cronobat=info,cronobat_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run(args) => commands::session::run(args, config),
        Commands::Simulate(args) => commands::session::simulate(args, config),
        Commands::Format { seconds } => commands::clock::format(seconds),
        Commands::Parse { clock } => commands::clock::parse(&clock),
        Commands::Config { action } => commands::config::run(action, config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
