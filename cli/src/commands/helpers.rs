use std::io::{self, BufRead, Write};

use anyhow::Result;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macrolog_core::models::{DailyTotals, DerivedTargets, MacroProgress, MealEntry};

const BAR_WIDTH: usize = 20;

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask a yes/no question. Anything but `y`/`yes`, including end of input,
/// is a no.
pub(crate) fn confirm(
    input: &mut impl BufRead,
    out: &mut impl Write,
    prompt: &str,
) -> io::Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

/// `entry 3` or `entries 3, 5`.
pub(crate) fn describe_entries(ids: &[i64]) -> String {
    let list = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    if ids.len() == 1 {
        format!("entry {list}")
    } else {
        format!("entries {list}")
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

/// Text progress bar for a percentage in `0..=100`.
#[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub(crate) fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub(crate) fn format_targets(targets: &DerivedTargets) -> String {
    format!(
        "Targets: carbs {:.1}g  protein {:.1}g  fat {:.1}g  ({:.0} kcal)",
        targets.carbs,
        targets.protein,
        targets.fat,
        targets.calories()
    )
}

pub(crate) fn format_totals_line(totals: &DailyTotals) -> String {
    format!(
        "Total: carbs {:.1}g  protein {:.1}g  fat {:.1}g  {:.1} kcal",
        no_neg_zero(totals.carbs),
        no_neg_zero(totals.protein),
        no_neg_zero(totals.fat),
        no_neg_zero(totals.calories)
    )
}

fn format_progress(label: &str, p: &MacroProgress) -> String {
    format!(
        "  {label:<8} {} {:>5.1}/{:.1}g  {:>3.0}%  remaining {:.1}g",
        progress_bar(p.percent),
        p.consumed,
        p.target,
        p.percent,
        p.remaining
    )
}

pub(crate) fn write_entries_table(out: &mut impl Write, entries: &[MealEntry]) -> io::Result<()> {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "kcal")]
        calories: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id,
            food: truncate(&e.food, 30),
            carbs: format!("{:.1}", e.carbs),
            protein: format!("{:.1}", e.protein),
            fat: format!("{:.1}", e.fat),
            calories: format!("{:.1}", e.calories()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    writeln!(out, "{table}")
}

/// Entries table, totals and (once a weight is set) per-macro progress.
pub(crate) fn write_day(
    out: &mut impl Write,
    entries: &[MealEntry],
    totals: &DailyTotals,
) -> io::Result<()> {
    writeln!(out, "=== {} ===", totals.date)?;
    if entries.is_empty() {
        writeln!(out, "No entries yet")?;
    } else {
        write_entries_table(out, entries)?;
    }
    writeln!(out, "{}", format_totals_line(totals))?;

    match (&totals.targets, &totals.progress) {
        (Some(targets), Some(progress)) => {
            writeln!(out, "{}", format_targets(targets))?;
            writeln!(out, "{}", format_progress("Carbs", &progress.carbs))?;
            writeln!(out, "{}", format_progress("Protein", &progress.protein))?;
            writeln!(out, "{}", format_progress("Fat", &progress.fat))?;
        }
        _ => writeln!(out, "No weight set for today; set one to see targets")?,
    }
    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn rice() -> MealEntry {
        MealEntry {
            id: 1,
            date: day(),
            food: "rice".to_string(),
            carbs: 50.0,
            protein: 5.0,
            fat: 0.0,
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(100.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(
            progress_bar(50.0),
            format!("[{}{}]", "#".repeat(10), "-".repeat(10))
        );
        // out-of-range input is clamped
        assert_eq!(progress_bar(250.0), progress_bar(100.0));
        assert_eq!(progress_bar(-5.0), progress_bar(0.0));
    }

    #[test]
    fn test_format_totals_line() {
        let totals = DailyTotals::from_entries(day(), &[rice()], None);
        assert_eq!(
            format_totals_line(&totals),
            "Total: carbs 50.0g  protein 5.0g  fat 0.0g  220.0 kcal"
        );
    }

    #[test]
    fn test_format_targets() {
        let line = format_targets(&DerivedTargets::from_weight(70.0));
        assert!(line.contains("carbs 140.0g"));
        assert!(line.contains("protein 105.0g"));
        assert!(line.contains("fat 40.0g"));
    }

    #[test]
    fn test_write_day_without_targets() {
        let entries = vec![rice()];
        let totals = DailyTotals::from_entries(day(), &entries, None);
        let mut out = Vec::new();
        write_day(&mut out, &entries, &totals).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== 2024-06-15 ==="));
        assert!(text.contains("rice"));
        assert!(text.contains("220.0"));
        assert!(text.contains("No weight set"));
    }

    #[test]
    fn test_write_day_with_targets() {
        let entries = vec![rice()];
        let totals =
            DailyTotals::from_entries(day(), &entries, Some(DerivedTargets::from_weight(20.0)));
        let mut out = Vec::new();
        write_day(&mut out, &entries, &totals).unwrap();
        let text = String::from_utf8(out).unwrap();
        // carbs target 40g, intake 50g
        assert!(text.contains("50.0/40.0g  100%  remaining 0.0g"));
        assert!(!text.contains("No weight set"));
    }

    #[test]
    fn test_write_day_empty() {
        let totals = DailyTotals::from_entries(day(), &[], None);
        let mut out = Vec::new();
        write_day(&mut out, &[], &totals).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No entries yet"));
        assert!(text.contains("0.0 kcal"));
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), r#"{"error":"nope"}"#);
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_confirm() {
        let mut out = Vec::new();
        assert!(confirm(&mut &b"y\n"[..], &mut out, "Delete entry 1? [y/N] ").unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "Delete entry 1? [y/N] ");

        assert!(confirm(&mut &b" YES \n"[..], &mut Vec::new(), "").unwrap());
        assert!(!confirm(&mut &b"n\n"[..], &mut Vec::new(), "").unwrap());
        assert!(!confirm(&mut &b"\n"[..], &mut Vec::new(), "").unwrap());
        assert!(!confirm(&mut &b""[..], &mut Vec::new(), "").unwrap());
    }

    #[test]
    fn test_describe_entries() {
        assert_eq!(describe_entries(&[3]), "entry 3");
        assert_eq!(describe_entries(&[3, 5]), "entries 3, 5");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
