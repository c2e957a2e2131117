use anyhow::Result;

use macrolog_core::Ledger;

use super::helpers::{format_targets, print_json};

pub(crate) fn cmd_weight(ledger: &mut Ledger, value: &str, json: bool) -> Result<()> {
    let targets = ledger.set_weight(value)?;

    if json {
        print_json(&targets)?;
    } else {
        println!("Weight set for {}", ledger.current_date());
        println!("{}", format_targets(&targets));
    }

    Ok(())
}
