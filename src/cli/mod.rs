//! Command-line interface for operating a pool.
//!
//! Every ledger operation and report is available as a subcommand. Amounts
//! are parsed as decimals, never binary floats.

mod ledger;
pub mod output;
mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::adapter::open_store;
use crate::config::Config;
use crate::domain::error::LedgerError;
use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::port::LedgerStore;

/// Share-based pool ledger
#[derive(Parser, Debug)]
#[command(name = "sharepool")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file [default: ~/.sharepool/config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Color output mode [auto, always, never]
    #[arg(long, global = true, default_value = "auto", hide_possible_values = true)]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    #[must_use]
    pub fn forced(self) -> Option<bool> {
        match self {
            ColorChoice::Auto => None,
            ColorChoice::Always => Some(true),
            ColorChoice::Never => Some(false),
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deposit cash for a participant, minting shares at the current NAV
    Deposit(DepositArgs),

    /// Redeem a participant's shares for cash at the current NAV
    Withdraw(WithdrawArgs),

    /// Commit cash to a new position
    Open(OpenArgs),

    /// Close the open position at its realized balance
    Close(CloseArgs),

    /// Show statistics for one participant
    Stats(StatsArgs),

    /// Show the pool summary and every account
    Summary,

    /// Show recent ledger events
    History(HistoryArgs),

    /// Check invariants and replay the history against the balances
    Verify,
}

#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Participant identifier
    pub participant: String,
    /// Cash amount to deposit
    #[arg(allow_hyphen_values = true)]
    pub amount: Decimal,
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Participant identifier
    pub participant: String,
    /// Number of shares to redeem
    #[arg(allow_hyphen_values = true)]
    pub shares: Decimal,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Cash balance the caller believes the pool holds
    #[arg(long, allow_hyphen_values = true)]
    pub expected_cash: Decimal,
    /// Cash to move into the position
    #[arg(long, allow_hyphen_values = true)]
    pub liquidity: Decimal,
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Balance realized when the position was closed
    #[arg(long, allow_hyphen_values = true)]
    pub realized: Decimal,
    /// Only close if the open position was opened by this event
    #[arg(long)]
    pub opened_seq: Option<u64>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Participant identifier
    pub participant: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of events to show [default: pool.history_limit]
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Open the configured store and run `cli.command` against it.
///
/// # Errors
/// Returns the store, ledger or output error that stopped the command.
pub fn execute(cli: &Cli, config: &Config) -> Result<()> {
    let store = open_store(&config.store)?;
    let ledger = Ledger::open(store)?;
    dispatch(&cli.command, &ledger, config)
}

/// Run one command against an open ledger.
///
/// # Errors
/// Returns the error that stopped the command.
pub fn dispatch<S: LedgerStore>(command: &Commands, ledger: &Ledger<S>, config: &Config) -> Result<()> {
    match command {
        Commands::Deposit(args) => ledger::deposit(ledger, args),
        Commands::Withdraw(args) => ledger::withdraw(ledger, args),
        Commands::Open(args) => ledger::open(ledger, args),
        Commands::Close(args) => ledger::close(ledger, args),
        Commands::Stats(args) => report::stats(ledger, args),
        Commands::Summary => report::summary(ledger, &config.pool.name),
        Commands::History(args) => {
            report::history(ledger, args.limit.unwrap_or(config.pool.history_limit))
        }
        Commands::Verify => report::verify(ledger),
    }
}

/// Process exit code for an error.
///
/// `1` for rejected operations, `2` for configuration problems and `3`
/// when the ledger is corrupt and needs reconciling.
#[must_use]
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Config(_) => 2,
        Error::Ledger(LedgerError::CorruptLedger { .. }) => 3,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_deposit() {
        let cli = Cli::try_parse_from(["sharepool", "deposit", "alice", "100.50"]).unwrap();
        match cli.command {
            Commands::Deposit(args) => {
                assert_eq!(args.participant, "alice");
                assert_eq!(args.amount, dec!(100.50));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_amount_reaches_the_ledger() {
        let cli = Cli::try_parse_from(["sharepool", "deposit", "alice", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Deposit(DepositArgs { amount, .. }) if amount == dec!(-5)));
    }

    #[test]
    fn rejects_float_garbage() {
        assert!(Cli::try_parse_from(["sharepool", "deposit", "alice", "ten"]).is_err());
    }

    #[test]
    fn parses_open_and_close_flags() {
        let cli = Cli::try_parse_from([
            "sharepool",
            "open",
            "--expected-cash",
            "300",
            "--liquidity",
            "120",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Open(OpenArgs { liquidity, .. }) if liquidity == dec!(120)));

        let cli = Cli::try_parse_from(["sharepool", "close", "--realized", "324", "--opened-seq", "3"])
            .unwrap();
        match cli.command {
            Commands::Close(args) => {
                assert_eq!(args.realized, dec!(324));
                assert_eq!(args.opened_seq, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sharepool", "summary", "--json", "-c", "pool.toml"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("pool.toml")));
        assert!(matches!(cli.color, ColorChoice::Auto));
    }

    #[test]
    fn history_limit_flag() {
        let cli = Cli::try_parse_from(["sharepool", "history", "-n", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::History(HistoryArgs { limit: Some(5) })));
    }

    #[test]
    fn exit_codes_by_error_kind() {
        let config: Error = ConfigError::MissingField { field: "pool.name" }.into();
        assert_eq!(exit_code(&config), 2);
        assert_eq!(exit_code(&LedgerError::corrupt("x").into()), 3);
        assert_eq!(exit_code(&LedgerError::NoOpenPosition.into()), 1);
    }
}
