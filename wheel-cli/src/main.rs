mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wheel_core::WheelError;

#[derive(Parser)]
#[command(name = "wheel")]
#[command(about = "Fortune wheel - one prize per Telegram user")]
#[command(version)]
struct Cli {
    /// Data directory for the spin database (ignored when DB_PATH is set)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the prize catalog in wheel order
    Prizes,
    /// Spin the wheel for the user in the given init data
    Claim {
        /// Raw initData string from the mini-app
        init_data: String,
    },
    /// Show whether the user in the given init data has spun
    Status {
        /// Raw initData string from the mini-app
        init_data: String,
    },
    /// List recorded spins
    Spins,
    /// Produce signed init data for local testing
    Sign(commands::SignArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "wheel={},wheel_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = run(cli.command, cli.data_dir).await;

    if let Err(e) = result {
        match e {
            WheelError::Auth(err) => {
                eprintln!("Error: {}", err);
                eprintln!("The init data was rejected (HTTP {})", err.status_code());
            }
            WheelError::Config(msg) => {
                eprintln!("Error: Invalid configuration: {}", msg);
                eprintln!("Check BOT_TOKEN, ADMIN_USER_ID, DB_PATH, LOG_DIR and WHEEL_PRIZES");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, data_dir: Option<PathBuf>) -> wheel_core::Result<()> {
    let config = config::load(data_dir)?;

    match command {
        Commands::Prizes => commands::list_prizes(&config),
        Commands::Claim { init_data } => commands::claim(&config, &init_data).await,
        Commands::Status { init_data } => commands::status(&config, &init_data).await,
        Commands::Spins => commands::list_spins(&config).await,
        Commands::Sign(args) => commands::sign(args, &config),
    }
}
