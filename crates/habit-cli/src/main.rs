use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use habit_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "habit",
    version,
    about = "Practice habit forming using randomised rewards"
)]
struct Cli {
    /// Habit store file (default: store.path from config, else ~/.habit)
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Habit(commands::habit::HabitAction),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();

    let loaded = Config::load_existing();
    let log_level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "warn".to_string());
    init_tracing(&log_level);

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("{e}; using default configuration");
        Config::default()
    });

    let result = match cli.command {
        Commands::Habit(action) => commands::habit::run(action, cli.file, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "habit", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
