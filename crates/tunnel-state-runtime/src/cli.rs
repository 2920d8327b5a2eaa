//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tunnel_state_core::ReconcilerConfig;
use tunnel_state_core::config::{DEFAULT_DEBOUNCE_MS, DEFAULT_FALLBACK_TIMEOUT_MS, MAX_TIMING_MS};

#[derive(Parser)]
#[command(
    name = "tunnel-stated",
    about = "Reconcile tunnel state notifications into a stable UI state"
)]
pub struct Cli {
    #[command(flatten)]
    pub timing: TimingOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read session inputs from stdin in real time (default)
    Run(RunOpts),
    /// Replay a recorded session against virtual time
    Replay(ReplayOpts),
}

#[derive(clap::Args)]
pub struct TimingOpts {
    /// Debounce window for service notifications, in milliseconds
    #[arg(
        long,
        global = true,
        env = "TUNNEL_STATE_DEBOUNCE_MS",
        default_value_t = DEFAULT_DEBOUNCE_MS as u64,
        value_parser = clap::value_parser!(u64).range(..=MAX_TIMING_MS)
    )]
    pub debounce_ms: u64,

    /// How long an optimistic state is shown unconfirmed, in milliseconds
    #[arg(
        long,
        global = true,
        env = "TUNNEL_STATE_FALLBACK_TIMEOUT_MS",
        default_value_t = DEFAULT_FALLBACK_TIMEOUT_MS as u64,
        value_parser = clap::value_parser!(u64).range(..=MAX_TIMING_MS)
    )]
    pub fallback_timeout_ms: u64,
}

impl TimingOpts {
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig::default()
            .with_debounce_ms(self.debounce_ms)
            .with_fallback_timeout_ms(self.fallback_timeout_ms)
    }
}

#[derive(clap::Args, Default)]
pub struct RunOpts {
    /// On end of input, keep running until pending timers have fired
    #[arg(long)]
    pub drain_on_eof: bool,
}

#[derive(clap::Args)]
pub struct ReplayOpts {
    /// JSON-lines file of inputs, each with an `at_ms` offset
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn timing_flags_apply_to_subcommands() {
        let cli = Cli::try_parse_from([
            "tunnel-stated",
            "replay",
            "session.jsonl",
            "--debounce-ms",
            "20",
            "--fallback-timeout-ms",
            "500",
        ])
        .expect("parse");

        let config = cli.timing.reconciler_config();
        assert_eq!(config.debounce.num_milliseconds(), 20);
        assert_eq!(config.fallback_timeout.num_milliseconds(), 500);
        match cli.command {
            Some(Command::Replay(opts)) => assert_eq!(opts.path, PathBuf::from("session.jsonl")),
            _ => panic!("expected replay command"),
        }
    }

    #[test]
    fn unrepresentable_timings_are_rejected() {
        let too_long = (MAX_TIMING_MS + 1).to_string();
        let result = Cli::try_parse_from(["tunnel-stated", "--fallback-timeout-ms", &too_long]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["tunnel-stated", "--debounce-ms", "-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_is_optional() {
        let cli = Cli::try_parse_from(["tunnel-stated"]).expect("parse");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["tunnel-stated", "run", "--drain-on-eof"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Run(RunOpts { drain_on_eof: true }))));
    }
}
