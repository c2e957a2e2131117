use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use macrolog_core::rollover::Rollover;
use macrolog_core::{Ledger, LedgerError};

use crate::commands::{
    delete_entries, describe_entries, format_targets, format_totals_line, is_yes, write_day,
};

const HELP: &str = "Commands:
  weight <kg>                            set today's weight and targets
  add <food>[, carbs[, protein[, fat]]]  add a meal (grams, blank = 0)
                                         quote a name containing commas:
                                         add \"rice, fried\", 60, 8, 12
  delete <id> [<id>...]                  delete meal entries (asks first)
  show                                   show today's entries and progress
  help                                   show this help
  quit                                   close the session";

#[derive(Debug, PartialEq)]
enum Command {
    Weight(String),
    Add {
        food: String,
        carbs: String,
        protein: String,
        fat: String,
    },
    Delete(Vec<i64>),
    Show,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    match word.to_lowercase().as_str() {
        "" => Ok(Command::Empty),
        "weight" | "w" => Ok(Command::Weight(rest.to_string())),
        "add" | "a" => parse_add(rest),
        "delete" | "del" | "rm" => rest
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|id| id.parse::<i64>().map_err(|_| format!("Invalid entry ID '{id}'")))
            .collect::<Result<_, _>>()
            .map(Command::Delete),
        "show" | "summary" | "ls" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{other}'. Type `help` for commands.")),
    }
}

/// `<food>[, carbs[, protein[, fat]]]`, where the name may be double-quoted
/// to keep commas in it.
fn parse_add(rest: &str) -> Result<Command, String> {
    let (food, fields) = if let Some(quoted) = rest.strip_prefix('"') {
        let (name, after) = quoted
            .split_once('"')
            .ok_or_else(|| "Missing closing quote in food name".to_string())?;
        let after = after.trim_start();
        let fields = match after.strip_prefix(',') {
            Some(fields) => fields,
            None if after.is_empty() => "",
            None => return Err(format!("Expected ',' after \"{name}\"")),
        };
        (name, fields)
    } else {
        rest.split_once(',').unwrap_or((rest, ""))
    };

    let mut fields = fields.splitn(3, ',').map(str::trim);
    let mut next = || fields.next().unwrap_or_default().to_string();
    Ok(Command::Add {
        food: food.trim().to_string(),
        carbs: next(),
        protein: next(),
        fat: next(),
    })
}

fn show(ledger: &Ledger, out: &mut impl Write) -> Result<()> {
    let entries = ledger.entries()?;
    let totals = ledger.daily_totals()?;
    write_day(out, &entries, &totals)?;
    Ok(())
}

fn execute(ledger: &mut Ledger, command: Command, out: &mut impl Write) -> Result<()> {
    let outcome = match command {
        Command::Weight(value) => ledger.set_weight(&value).map(|t| format_targets(&t)),
        Command::Add {
            food,
            carbs,
            protein,
            fat,
        } => ledger
            .add_meal(&food, &carbs, &protein, &fat)
            .map(|e| format!("Added [{}] {}: {:.1} kcal", e.id, e.food, e.calories())),
        Command::Delete(ids) => delete_entries(ledger, &ids).map(|o| o.lines().join("\n")),
        Command::Show => return show(ledger, out),
        Command::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(());
        }
        Command::Quit | Command::Empty => return Ok(()),
    };

    match outcome {
        Ok(message) => {
            writeln!(out, "{message}")?;
            show(ledger, out)?;
        }
        Err(LedgerError::EmptySelection) => writeln!(out, "{}", LedgerError::EmptySelection)?,
        Err(e) if e.is_recoverable() => writeln!(out, "Error: {e}")?,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn handle_rollover(ledger: &mut Ledger, rollover: Rollover, out: &mut impl Write) -> Result<()> {
    if rollover.current == ledger.current_date() {
        return Ok(());
    }
    ledger.reset_for_new_day(rollover.current)?;
    writeln!(
        out,
        "\nNew day: {}. The previous log was cleared; set today's weight to see targets.",
        rollover.current
    )?;
    show(ledger, out)
}

/// Drive the session until `quit` is confirmed or input ends.
///
/// One loop owns the ledger and multiplexes typed commands with rollover
/// events from the background monitor, so every write and redraw happens on
/// this task.
pub(crate) async fn run<R>(
    mut ledger: Ledger,
    reader: R,
    out: &mut impl Write,
    mut rollovers: mpsc::Receiver<Rollover>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    writeln!(
        out,
        "macrolog session for {}. Type `help` for commands.",
        ledger.current_date()
    )?;
    show(&ledger, out)?;

    loop {
        write!(out, "> ")?;
        out.flush()?;

        tokio::select! {
            biased;

            Some(rollover) = rollovers.recv() => {
                handle_rollover(&mut ledger, rollover, out)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Err(message) => writeln!(out, "{message}")?,
                    Ok(Command::Quit) => {
                        write!(out, "Quit and close the ledger? [y/N] ")?;
                        out.flush()?;
                        match lines.next_line().await? {
                            Some(answer) if !is_yes(&answer) => {}
                            _ => break,
                        }
                    }
                    Ok(Command::Delete(ids)) if !ids.is_empty() => {
                        write!(out, "Delete {}? [y/N] ", describe_entries(&ids))?;
                        out.flush()?;
                        match lines.next_line().await? {
                            Some(answer) if is_yes(&answer) => {
                                execute(&mut ledger, Command::Delete(ids), out)?;
                            }
                            Some(_) => writeln!(out, "Nothing deleted")?,
                            None => break,
                        }
                    }
                    Ok(command) => execute(&mut ledger, command, out)?,
                }
            }
        }
    }

    let totals = ledger.daily_totals()?;
    writeln!(out, "\n{}", format_totals_line(&totals))?;
    writeln!(out, "See you tomorrow!")?;
    ledger.close();
    Ok(())
}
