use chrono::NaiveDate;
use serde::Serialize;

use crate::error::LedgerError;

pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Grams of carbohydrate per kilogram of body weight.
pub const CARBS_PER_KG: f64 = 2.0;
/// Grams of protein per kilogram of body weight.
pub const PROTEIN_PER_KG: f64 = 1.5;
/// Fat target does not scale with weight.
pub const FAT_TARGET_G: f64 = 40.0;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[must_use]
pub fn calories(carbs: f64, protein: f64, fat: f64) -> f64 {
    carbs * KCAL_PER_G_CARBS + protein * KCAL_PER_G_PROTEIN + fat * KCAL_PER_G_FAT
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub food: String,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

impl MealEntry {
    #[must_use]
    pub fn calories(&self) -> f64 {
        calories(self.carbs, self.protein, self.fat)
    }
}

#[derive(Debug, Clone)]
pub struct NewMealEntry {
    pub date: NaiveDate,
    pub food: String,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyWeightRecord {
    pub date: NaiveDate,
    pub weight: f64,
}

/// Daily gram targets computed from body weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedTargets {
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

impl DerivedTargets {
    #[must_use]
    pub fn from_weight(weight_kg: f64) -> Self {
        Self {
            carbs: weight_kg * CARBS_PER_KG,
            protein: weight_kg * PROTEIN_PER_KG,
            fat: FAT_TARGET_G,
        }
    }

    #[must_use]
    pub fn calories(&self) -> f64 {
        calories(self.carbs, self.protein, self.fat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroProgress {
    pub consumed: f64,
    pub target: f64,
    /// Share of the target reached, capped at 100.
    pub percent: f64,
    /// Grams left before the target, floored at 0.
    pub remaining: f64,
}

impl MacroProgress {
    #[must_use]
    pub fn new(consumed: f64, target: f64) -> Self {
        let percent = if target > 0.0 {
            (consumed / target * 100.0).min(100.0)
        } else {
            100.0
        };
        Self {
            consumed,
            target,
            percent,
            remaining: (target - consumed).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub carbs: MacroProgress,
    pub protein: MacroProgress,
    pub fat: MacroProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub entry_count: usize,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<DerivedTargets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl DailyTotals {
    #[must_use]
    pub fn from_entries(
        date: NaiveDate,
        entries: &[MealEntry],
        targets: Option<DerivedTargets>,
    ) -> Self {
        let carbs: f64 = entries.iter().map(|e| e.carbs).sum();
        let protein: f64 = entries.iter().map(|e| e.protein).sum();
        let fat: f64 = entries.iter().map(|e| e.fat).sum();

        let progress = targets.map(|t| Progress {
            carbs: MacroProgress::new(carbs, t.carbs),
            protein: MacroProgress::new(protein, t.protein),
            fat: MacroProgress::new(fat, t.fat),
        });

        Self {
            date,
            entry_count: entries.len(),
            carbs,
            protein,
            fat,
            calories: calories(carbs, protein, fat),
            targets,
            progress,
        }
    }
}

/// Rows removed by a retention purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub meals_deleted: usize,
    pub weights_deleted: usize,
}

/// Parse a gram amount typed by the user.
///
/// Blank input counts as zero. Anything that is not a finite, non-negative
/// number is rejected with a message that quotes the input.
pub fn parse_amount(value: &str) -> Result<f64, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let n: f64 = trimmed
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| {
            LedgerError::InvalidInput(format!("'{value}' is not a valid number"))
        })?;
    if n < 0.0 {
        return Err(LedgerError::InvalidInput(format!(
            "'{value}' must not be negative"
        )));
    }
    // "-0" parses to -0.0
    Ok(n + 0.0)
}

pub fn parse_weight(value: &str) -> Result<f64, LedgerError> {
    let kg = parse_amount(value)?;
    if kg == 0.0 {
        return Err(LedgerError::InvalidInput(
            "Weight must be greater than 0".to_string(),
        ));
    }
    Ok(kg)
}

pub fn validate_food_name(food: &str) -> Result<String, LedgerError> {
    let food = food.trim();
    if food.is_empty() {
        return Err(LedgerError::InvalidInput(
            "Food name must not be empty".to_string(),
        ));
    }
    Ok(food.to_string())
}
