//! Handlers for the read-only commands.

use chrono::SecondsFormat;
use tabled::{Table, Tabled};

use super::{output, StatsArgs};
use crate::domain::{AccountStats, LedgerEvent};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::port::LedgerStore;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Participant")]
    participant: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "% Pool")]
    percent: String,
    #[tabled(rename = "Deposited")]
    deposited: String,
    #[tabled(rename = "Withdrawn")]
    withdrawn: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "P/L")]
    profit_loss: String,
}

impl From<&AccountStats> for AccountRow {
    fn from(stats: &AccountStats) -> Self {
        Self {
            participant: stats.participant.to_string(),
            shares: output::amount(stats.shares),
            percent: format!("{}%", stats.percent_of_pool.round_dp(2).normalize()),
            deposited: output::amount(stats.total_deposited),
            withdrawn: output::amount(stats.total_withdrawn),
            value: output::amount(stats.current_value),
            profit_loss: output::amount(stats.profit_loss),
        }
    }
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "#")]
    seq: u64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Participant")]
    participant: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "NAV")]
    nav: String,
}

impl From<&LedgerEvent> for EventRow {
    fn from(event: &LedgerEvent) -> Self {
        Self {
            seq: event.seq,
            time: event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            kind: event.kind.to_string(),
            participant: event
                .participant
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            amount: event.amount.map_or_else(|| "-".to_string(), output::amount),
            shares: event
                .shares_delta
                .map_or_else(|| "-".to_string(), output::amount),
            nav: output::amount(event.resulting_nav),
        }
    }
}

pub(super) fn stats<S: LedgerStore>(ledger: &Ledger<S>, args: &StatsArgs) -> Result<()> {
    let stats = ledger.account_stats(args.participant.as_str())?;
    output::json_payload("account", &stats)?;

    output::section(stats.participant.as_str());
    output::field("Shares", output::amount(stats.shares));
    output::field(
        "% of pool",
        format!("{}%", stats.percent_of_pool.round_dp(2).normalize()),
    );
    output::field("Deposited", output::amount(stats.total_deposited));
    output::field("Withdrawn", output::amount(stats.total_withdrawn));
    output::field("Value", output::amount(stats.current_value));
    output::field("P/L", output::signed(stats.profit_loss));
    Ok(())
}

pub(super) fn summary<S: LedgerStore>(ledger: &Ledger<S>, pool: &str) -> Result<()> {
    let summary = ledger.pool_summary()?;
    output::json_payload("summary", &summary)?;

    output::header(pool);
    output::field("NAV", output::highlight(output::amount(summary.nav)));
    output::field("Assets", output::amount(summary.pool_assets));
    output::field("Cash", output::amount(summary.cash));
    let position = if summary.position_open {
        format!("open, marked at {}", output::amount(summary.position_mark))
    } else {
        output::muted("idle")
    };
    output::field("Position", position);
    output::field("Shares", output::amount(summary.total_shares));

    if summary.accounts.is_empty() {
        output::hint("no deposits yet: sharepool deposit <participant> <amount>");
        return Ok(());
    }

    output::section("Accounts");
    let rows: Vec<AccountRow> = summary.accounts.iter().map(AccountRow::from).collect();
    output::table(&Table::new(rows).to_string());
    output::field("Total P/L", output::signed(summary.total_profit_loss()));
    Ok(())
}

pub(super) fn history<S: LedgerStore>(ledger: &Ledger<S>, limit: usize) -> Result<()> {
    let events = ledger.history(limit);
    output::json_payload("history", &events)?;

    if events.is_empty() {
        output::hint("the ledger has no events yet");
        return Ok(());
    }
    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    output::table(&Table::new(rows).to_string());
    Ok(())
}

pub(super) fn verify<S: LedgerStore>(ledger: &Ledger<S>) -> Result<()> {
    let snapshot = ledger.snapshot();
    ledger.audit()?;

    output::json_payload(
        "verified",
        &serde_json::json!({ "events": snapshot.history.len() }),
    )?;
    output::success(&format!(
        "Ledger consistent ({} events replayed)",
        snapshot.history.len()
    ));
    Ok(())
}
