//! Handlers for the mutating commands.

use super::{output, CloseArgs, DepositArgs, OpenArgs, WithdrawArgs};
use crate::error::Result;
use crate::ledger::{Ledger, Receipt};
use crate::port::LedgerStore;

pub(super) fn deposit<S: LedgerStore>(ledger: &Ledger<S>, args: &DepositArgs) -> Result<()> {
    let receipt = ledger.deposit(args.participant.as_str(), args.amount)?;
    output::json_payload("receipt", &receipt)?;

    output::success(&format!(
        "Deposited {} for {}",
        output::amount(receipt.amount()),
        output::highlight(&args.participant)
    ));
    output::field("Minted", output::amount(receipt.shares_delta()));
    output::field("Price", output::amount(receipt.price()));
    print_account(&receipt);
    Ok(())
}

pub(super) fn withdraw<S: LedgerStore>(ledger: &Ledger<S>, args: &WithdrawArgs) -> Result<()> {
    let receipt = ledger.withdraw(args.participant.as_str(), args.shares)?;
    output::json_payload("receipt", &receipt)?;

    output::success(&format!(
        "Paid out {} to {}",
        output::amount(receipt.amount()),
        output::highlight(&args.participant)
    ));
    output::field("Burned", output::amount(-receipt.shares_delta()));
    output::field("Price", output::amount(receipt.price()));
    print_account(&receipt);
    Ok(())
}

pub(super) fn open<S: LedgerStore>(ledger: &Ledger<S>, args: &OpenArgs) -> Result<()> {
    let receipt = ledger.open_position(args.expected_cash, args.liquidity)?;
    output::json_payload("receipt", &receipt)?;

    output::success(&format!(
        "Opened position #{} with {}",
        receipt.seq(),
        output::amount(receipt.amount())
    ));
    output::field("Cash left", output::amount(receipt.cash));
    output::field("NAV", output::amount(receipt.nav()));
    output::hint(&format!(
        "close with: sharepool close --realized <balance> --opened-seq {}",
        receipt.seq()
    ));
    Ok(())
}

pub(super) fn close<S: LedgerStore>(ledger: &Ledger<S>, args: &CloseArgs) -> Result<()> {
    let receipt = match args.opened_seq {
        Some(seq) => ledger.close_position_checked(seq, args.realized)?,
        None => ledger.close_position(args.realized)?,
    };
    output::json_payload("receipt", &receipt)?;

    output::success(&format!(
        "Closed position at {}",
        output::amount(receipt.amount())
    ));
    if let Some(pnl) = receipt.realized_pnl() {
        output::field("Realized P/L", output::signed(pnl));
    }
    output::field("NAV", output::amount(receipt.nav()));
    Ok(())
}

fn print_account(receipt: &Receipt) {
    if let Some(account) = &receipt.account {
        output::field("Shares held", output::amount(account.shares));
    }
    output::field("Total shares", output::amount(receipt.total_shares()));
    output::field("NAV", output::amount(receipt.nav()));
}
