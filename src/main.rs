//! Binary entrypoint for the petsim CLI.
//!
//! Commands:
//! - `start [--bind <addr>]` - run the JSON-lines pet server
//! - `init` - write a default `petsim.toml`
//! - `show <user>` - print a pet's status panel
//! - `leaderboard [--limit <n>]` - print the top pets
//!
//! See the library crate docs for module-level details: `petsim::`.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use petsim::config::Config;
use petsim::pet::format_pet_status;
use petsim::server::PetServer;
use petsim::service::PetService;

#[derive(Parser)]
#[command(name = "petsim")]
#[command(about = "A virtual pet state engine and server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "petsim.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pet server
    Start {
        /// Address to listen on, overriding `[server].bind`
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Write a default configuration file
    Init,
    /// Show a user's pet
    Show {
        /// User id
        user: String,
    },
    /// Print the leaderboard
    Leaderboard {
        /// Number of entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(None, cli.verbose);
        if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
            return Err(anyhow!("{} already exists; refusing to overwrite", cli.config));
        }
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let mut config = Config::load(&cli.config).await?;
    init_logging(Some(&config), cli.verbose);

    match cli.command {
        Commands::Start { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            info!("Starting petsim v{}", env!("CARGO_PKG_VERSION"));
            let service = Arc::new(PetService::from_config(&config)?);
            PetServer::new(service, &config.server).run().await?;
        }
        Commands::Show { user } => {
            let service = PetService::from_config(&config)?;
            let state = service.get(&user)?;
            print!("{}", format_pet_status(&service.status(&state)));
        }
        Commands::Leaderboard { limit } => {
            let service = PetService::from_config(&config)?;
            let entries = service.leaderboard(limit)?;
            if entries.is_empty() {
                println!("No pets yet.");
            }
            for entry in entries {
                println!(
                    "{:>3}. {:<20} {:<7} L{:<3} happiness {:>3}%  {} interactions",
                    entry.rank,
                    entry.user_id,
                    entry.pet_type,
                    entry.level,
                    entry.happiness,
                    entry.total_interactions
                );
            }
        }
        Commands::Init => {}
    }

    Ok(())
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // -v overrides the configured level
    let level = match verbosity {
        0 => config
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let log_file = config
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(file) = log_file {
        let file = std::sync::Mutex::new(file);
        // Mirror to the console only when someone is watching it.
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
