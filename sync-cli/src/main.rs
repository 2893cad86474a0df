//! # playsync-cli
//!
//! Diagnostic tool for the playsync protocol.
//!
//! ## Commands
//!
//! - `simulate`: Run two simulated peers against an in-process room
//! - `encode`: Print a status message as it goes over the wire
//!
//! ## Example
//!
//! ```bash
//! # Watch two peers stay in sync for 20 seconds
//! playsync-cli simulate --seconds 20
//!
//! # Same, with custom timings
//! playsync-cli simulate --config sync.toml
//!
//! # Inspect a CHECK message
//! playsync-cli encode --kind CHECK --seek 42.5 --playing --expire-id 7
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use playsync_types::MessageType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod room;

use commands::{encode, simulate};

/// Diagnostic tool for the playsync protocol.
#[derive(Parser, Debug)]
#[command(name = "playsync-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log verbosely (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run two simulated peers against an in-process room
    Simulate {
        /// Sync configuration file (TOML)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// How long to run, in seconds
        #[arg(long, default_value = "20")]
        seconds: u64,

        /// Simulate a live stream instead of on-demand media
        #[arg(long)]
        live: bool,
    },

    /// Print a status message as JSON (or MessagePack hex)
    Encode {
        /// Message type, e.g. PLAY or CHANGE_SEEK
        #[arg(long, short)]
        kind: MessageType,

        /// Position in seconds
        #[arg(long, default_value = "0")]
        seek: f64,

        /// Playback rate
        #[arg(long, default_value = "1")]
        rate: f64,

        /// Transport is playing (CHANGE_RATE and CHECK)
        #[arg(long)]
        playing: bool,

        /// Expire epoch (CHECK only)
        #[arg(long, default_value = "0")]
        expire_id: u64,

        /// Emission time in ms since the epoch (defaults to now)
        #[arg(long)]
        time: Option<i64>,

        /// Print MessagePack bytes as hex instead of JSON
        #[arg(long)]
        msgpack: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate {
            config,
            seconds,
            live,
        } => {
            let config = config::load(config.as_deref())?;
            simulate::run(&config, seconds, live).await?;
        }
        Commands::Encode {
            kind,
            seek,
            rate,
            playing,
            expire_id,
            time,
            msgpack,
        } => {
            let message = encode::build(kind, seek, rate, playing, expire_id, time);
            println!("{}", encode::render(&message, msgpack)?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
