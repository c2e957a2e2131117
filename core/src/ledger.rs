use chrono::NaiveDate;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{LedgerError, Result};
use crate::models::{
    DailyTotals, DerivedTargets, MealEntry, NewMealEntry, PurgeSummary, parse_amount,
    parse_weight, validate_food_name,
};

/// The active day's meals and weight-based targets.
///
/// All mutations go through `&mut self`, so whoever owns the ledger is the
/// only writer to the store.
pub struct Ledger {
    db: Database,
    current_date: NaiveDate,
    targets: Option<DerivedTargets>,
    purged_on_open: PurgeSummary,
}

impl Ledger {
    /// Wrap `db` for `today`, dropping rows left over from earlier days.
    ///
    /// A weight already recorded for `today` restores its targets.
    pub fn open(db: Database, today: NaiveDate) -> Result<Self> {
        let purged = db.purge_except(today)?;
        if purged != PurgeSummary::default() {
            info!(
                date = %today,
                meals = purged.meals_deleted,
                weights = purged.weights_deleted,
                "Purged stale entries on open"
            );
        }
        let targets = db
            .get_weight(today)?
            .map(|record| DerivedTargets::from_weight(record.weight));
        Ok(Self {
            db,
            current_date: today,
            targets,
            purged_on_open: purged,
        })
    }

    pub fn open_in_memory(today: NaiveDate) -> Result<Self> {
        Self::open(Database::open_in_memory()?, today)
    }

    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// Rows from earlier days removed when the ledger was opened.
    #[must_use]
    pub fn purged_on_open(&self) -> PurgeSummary {
        self.purged_on_open
    }

    #[must_use]
    pub fn targets(&self) -> Option<DerivedTargets> {
        self.targets
    }

    pub fn set_weight(&mut self, value: &str) -> Result<DerivedTargets> {
        let weight = parse_weight(value)?;
        self.db.upsert_weight(self.current_date, weight)?;
        let targets = DerivedTargets::from_weight(weight);
        self.targets = Some(targets);
        info!(
            date = %self.current_date,
            weight,
            carbs = targets.carbs,
            protein = targets.protein,
            "Weight set"
        );
        Ok(targets)
    }

    /// Record a meal for the current day.
    ///
    /// Every field is validated before anything is written.
    pub fn add_meal(
        &mut self,
        food: &str,
        carbs: &str,
        protein: &str,
        fat: &str,
    ) -> Result<MealEntry> {
        let food = validate_food_name(food)?;
        let carbs = parse_amount(carbs)?;
        let protein = parse_amount(protein)?;
        let fat = parse_amount(fat)?;

        let entry = self.db.insert_meal(&NewMealEntry {
            date: self.current_date,
            food,
            carbs,
            protein,
            fat,
        })?;
        info!(id = entry.id, food = %entry.food, kcal = entry.calories(), "Meal added");
        Ok(entry)
    }

    /// Delete the selected entry. Returns whether a row was removed.
    pub fn delete_meal(&mut self, selection: Option<i64>) -> Result<bool> {
        let id = selection.ok_or(LedgerError::EmptySelection)?;
        let deleted = self.db.delete_meal(id)?;
        if deleted {
            info!(id, "Meal deleted");
        } else {
            warn!(id, "No meal entry with this id");
        }
        Ok(deleted)
    }

    pub fn entries(&self) -> Result<Vec<MealEntry>> {
        Ok(self.db.get_meals_for_date(self.current_date)?)
    }

    pub fn daily_totals(&self) -> Result<DailyTotals> {
        let entries = self.entries()?;
        Ok(DailyTotals::from_entries(
            self.current_date,
            &entries,
            self.targets,
        ))
    }

    /// Make `date` the active day: purge every other day and forget targets.
    pub fn reset_for_new_day(&mut self, date: NaiveDate) -> Result<PurgeSummary> {
        let purged = self.db.purge_except(date)?;
        let previous = self.current_date;
        self.current_date = date;
        self.targets = None;
        info!(
            %previous,
            current = %date,
            meals = purged.meals_deleted,
            weights = purged.weights_deleted,
            "Ledger reset for new day"
        );
        Ok(purged)
    }

    /// Release the store.
    pub fn close(self) {
        drop(self.db);
    }
}
