use anyhow::Result;
use std::io;

use macrolog_core::Ledger;
use macrolog_core::models::PurgeSummary;

use super::helpers::{print_json, write_day};

pub(crate) fn cmd_summary(ledger: &Ledger, json: bool) -> Result<()> {
    let totals = ledger.daily_totals()?;

    if json {
        return print_json(&serde_json::json!({
            "entries": ledger.entries()?,
            "totals": totals,
        }));
    }

    let entries = ledger.entries()?;
    write_day(&mut io::stdout().lock(), &entries, &totals)?;
    Ok(())
}

fn reset_message(ledger: &Ledger, purged: PurgeSummary) -> String {
    format!(
        "Kept {}; removed {} meal(s) and {} weight record(s)",
        ledger.current_date(),
        purged.meals_deleted,
        purged.weights_deleted
    )
}

/// Report what the purge run while opening the ledger removed.
///
/// Opening already discards every day but today, so there is nothing left
/// to delete here; today's rows and targets stay as they are.
pub(crate) fn cmd_reset(ledger: &Ledger, json: bool) -> Result<()> {
    let purged = ledger.purged_on_open();

    if json {
        print_json(&purged)?;
    } else {
        println!("{}", reset_message(ledger, purged));
    }

    Ok(())
}
