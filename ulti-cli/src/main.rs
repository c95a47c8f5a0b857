//! CLI for Ultimate 64 / Ultimate-II+ remote control.

#![allow(clippy::print_stderr, clippy::missing_docs_in_private_items)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use ulti::{ActionFlags, ConnectOptions, Dispatcher, OperationRequest};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ULTI_LOG";

#[derive(Parser)]
#[command(
    name = "ulti",
    version,
    about = "Remote control for Ultimate 64 / Ultimate-II+ devices",
    args_conflicts_with_subcommands = true,
    group(ArgGroup::new("action").args(["reset", "power_off", "stream_on", "stream_off", "load", "run"]))
)]
struct Cli {
    /// Device IP address or host name.
    #[arg(short = 'i', long, env = "ULTI_HOST")]
    host: Option<String>,

    /// Reset the machine.
    #[arg(short, long)]
    reset: bool,

    /// Power the machine off.
    #[arg(short = 'o', long)]
    power_off: bool,

    /// Start audio and video streaming (Ultimate 64 only).
    #[arg(short = 's', long)]
    stream_on: bool,

    /// Stop audio and video streaming (Ultimate 64 only).
    #[arg(short = 'S', long)]
    stream_off: bool,

    /// DMA-load a PRG, or mount a D64 image, without running it.
    #[arg(short, long, value_name = "FILE")]
    load: Option<PathBuf>,

    /// DMA-load and run a PRG, or mount and run a D64 image.
    #[arg(short = 'p', long, value_name = "FILE")]
    run: Option<PathBuf>,

    /// Connect and write timeout in seconds (0 waits forever).
    #[arg(short, long, env = "ULTI_TIMEOUT", value_name = "SECS", default_value_t = 0)]
    timeout: u64,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.dispatch() {
        eprintln!("ulti: {e:#}");
        std::process::exit(1);
    }
}

/// Installs a stderr subscriber; `ULTI_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Log level used when `ULTI_LOG` is unset.
const fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        if let Some(Command::Completion { shell }) = self.command {
            clap_complete::generate(shell, &mut Self::command(), "ulti", &mut std::io::stdout());
            return Ok(());
        }

        let flags = ActionFlags {
            reset: self.reset,
            power_off: self.power_off,
            stream_on: self.stream_on,
            stream_off: self.stream_off,
            load: self.load,
            run: self.run,
        };
        let host = self.host.unwrap_or_default();
        let req = OperationRequest::from_flags(host, flags).context("invalid arguments")?;

        let timeout = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        let opts = ConnectOptions::new().timeout(timeout);
        debug!(?req, ?timeout, "dispatching");

        Dispatcher::new(opts)
            .run(&req)
            .with_context(|| format!("{} failed", req.operation().action()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn actions_are_exclusive() {
        let res = Cli::try_parse_from(["ulti", "-i", "u64", "-r", "-p", "game.prg"]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_run() {
        let cli = Cli::try_parse_from(["ulti", "-i", "10.0.0.64", "--run", "game.d64"]).unwrap();
        assert_eq!(cli.host.as_deref(), Some("10.0.0.64"));
        assert_eq!(cli.run, Some(PathBuf::from("game.d64")));
        assert!(!cli.reset);
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["ulti", "-i", "h", "-r", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(1), "info");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(5), "debug");
    }
}
