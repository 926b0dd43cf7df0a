//! iframe-coordinator configuration tool.
//!
//! # Usage
//!
//! ```bash
//! # Which client owns these routes?
//! ifc --config host.json resolve orders/42 reports
//!
//! # Are these captured messages valid for a host to receive?
//! ifc validate captured.json --direction client-to-host
//!
//! # Does the configuration load, and does anything look wrong?
//! ifc --config host.json check
//! ```

use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use ifc_cli::{HostConfig, commands};
use ifc_proto::Direction;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// iframe-coordinator configuration tool
#[derive(Parser, Debug)]
#[command(name = "ifc")]
#[command(about = "Check iframe-coordinator host configurations and messages")]
#[command(version)]
struct Args {
    /// Host configuration file (JSON)
    #[arg(short, long, default_value = "ifc.json", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which client owns each route and the URL its frame would load
    Resolve {
        /// Host routes to resolve
        #[arg(required = true)]
        routes: Vec<String>,
    },

    /// Classify captured messages (one JSON value or an array)
    Validate {
        /// File with the captured messages
        file: PathBuf,

        /// Role of the receiver the messages are checked for
        #[arg(short, long, value_enum, default_value = "client-to-host")]
        direction: MessageDirection,
    },

    /// Load the configuration and report problems
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MessageDirection {
    /// Messages sent by clients, checked as a host would
    ClientToHost,
    /// Messages sent by hosts, checked as a client would
    HostToClient,
}

impl From<MessageDirection> for Direction {
    fn from(direction: MessageDirection) -> Self {
        match direction {
            MessageDirection::ClientToHost => Direction::ClientToHost,
            MessageDirection::HostToClient => Direction::HostToClient,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let lines = match args.command {
        Command::Resolve { routes } => commands::resolve(&HostConfig::load(&args.config)?, &routes)?,
        Command::Check => commands::check(&HostConfig::load(&args.config)?)?,
        Command::Validate { file, direction } => {
            let report = commands::validate(&file, direction.into())?;
            // Print every verdict before failing on violations.
            write_lines(&report.lines)?;
            report.into_result()?;
            return Ok(());
        },
    };

    write_lines(&lines)?;
    Ok(())
}

fn write_lines(lines: &[String]) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
