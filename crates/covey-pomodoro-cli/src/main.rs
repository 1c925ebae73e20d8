use clap::{Parser, Subcommand};
use covey_pomodoro_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

const LOG_ENV: &str = "COVEY_POMODORO_LOG";

#[derive(Parser)]
#[command(name = "covey-pomodoro", version, about = "Covey Pomodoro timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Session statistics
    Stats {
        /// Only today's totals
        #[arg(long)]
        today: bool,
    },
    /// List saved sessions
    Sessions {
        /// Only sessions of this task
        #[arg(long)]
        task: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    // stdout carries the JSON output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config).await,
        Commands::Task { action } => commands::task::run(action),
        Commands::Stats { today } => commands::stats::run_stats(today),
        Commands::Sessions { task } => commands::stats::run_sessions(task.as_deref()),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
