use anyhow::Result;
use serde::Serialize;
use std::io;
use std::process;

use macrolog_core::{Ledger, LedgerError};

use super::helpers::{confirm, describe_entries, format_totals_line, json_error, print_json};

pub(crate) fn cmd_add(
    ledger: &mut Ledger,
    food: &str,
    carbs: &str,
    protein: &str,
    fat: &str,
    json: bool,
) -> Result<()> {
    let entry = ledger.add_meal(food, carbs, protein, fat)?;

    if json {
        print_json(&entry)?;
    } else {
        let id = entry.id;
        let name = &entry.food;
        let cal = entry.calories();
        println!("Added [{id}] {name}: {cal:.1} kcal");
        println!("{}", format_totals_line(&ledger.daily_totals()?));
    }

    Ok(())
}

/// Result of deleting a batch of selected entries.
#[derive(Debug, Default, PartialEq, Serialize)]
pub(crate) struct DeleteOutcome {
    pub deleted: Vec<i64>,
    pub not_found: Vec<i64>,
}

impl DeleteOutcome {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.deleted
            .iter()
            .map(|id| format!("Deleted entry {id}"))
            .chain(self.not_found.iter().map(|id| format!("Entry {id} not found")))
            .collect()
    }
}

/// Delete every selected entry, ignoring repeated IDs.
pub(crate) fn delete_entries(
    ledger: &mut Ledger,
    ids: &[i64],
) -> Result<DeleteOutcome, LedgerError> {
    if ids.is_empty() {
        return Err(LedgerError::EmptySelection);
    }
    let mut outcome = DeleteOutcome::default();
    for (i, &id) in ids.iter().enumerate() {
        if ids[..i].contains(&id) {
            continue;
        }
        if ledger.delete_meal(Some(id))? {
            outcome.deleted.push(id);
        } else {
            outcome.not_found.push(id);
        }
    }
    Ok(outcome)
}

pub(crate) fn cmd_delete(
    ledger: &mut Ledger,
    entry_ids: &[i64],
    yes: bool,
    json: bool,
) -> Result<()> {
    if entry_ids.is_empty() {
        let message = LedgerError::EmptySelection.to_string();
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}. Run `macrolog summary` to see entry IDs.");
        }
        return Ok(());
    }

    // Prompt on stderr so --json output stays clean
    if !yes {
        let prompt = format!("Delete {}? [y/N] ", describe_entries(entry_ids));
        if !confirm(&mut io::stdin().lock(), &mut io::stderr(), &prompt)? {
            if json {
                print_json(&DeleteOutcome::default())?;
            } else {
                eprintln!("Nothing deleted");
            }
            return Ok(());
        }
    }

    let outcome = delete_entries(ledger, entry_ids)?;
    if json {
        print_json(&outcome)?;
    } else {
        for id in &outcome.deleted {
            println!("Deleted entry {id}");
        }
        for id in &outcome.not_found {
            eprintln!("Entry {id} not found");
        }
    }

    if !outcome.not_found.is_empty() {
        process::exit(2);
    }
    Ok(())
}
