//! meshgate CLI
//!
//! Offline companion: encode mesh commands and edit the settings record
//! without starting the gateway.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use meshgate::protocol::{encode_frame, parse_command};
use meshgate::settings::SettingsStore;
use meshgate::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// meshgate CLI
#[derive(Parser, Debug)]
#[command(name = "meshgate-cli")]
#[command(about = "Offline tools for the meshgate gateway")]
#[command(version)]
struct Args {
    /// Settings record file
    #[arg(short, long, default_value = "./meshgate_settings.bin")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the frame for a mesh command (e.g. C6O1A2B)
    Encode {
        /// The command text
        line: String,
    },

    /// Get a setting
    Get {
        /// Setting key (e.g. mqtt.host)
        key: String,
    },

    /// Change a setting
    Set {
        /// Setting key
        key: String,

        /// New value
        value: String,
    },

    /// List every setting
    List,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Encode { line } => {
            let command = parse_command(&line)?;
            let frame = encode_frame(&command);
            println!("{:?}", command);
            println!("{}", frame.to_hex());
        }
        Commands::Get { key } => {
            let store = SettingsStore::open(&args.settings)?;
            println!("{}", store.get(&key)?);
        }
        Commands::Set { key, value } => {
            let mut store = SettingsStore::open(&args.settings)?;
            store.set(&key, &value)?;
            println!("{} = {}", key, store.get(&key)?);
        }
        Commands::List => {
            let store = SettingsStore::open(&args.settings)?;
            for (key, value) in store.list() {
                println!("{} = {}", key, value);
            }
        }
    }
    Ok(())
}
