use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params, types::Type};

use crate::models::{DATE_FORMAT, DailyWeightRecord, MealEntry, NewMealEntry, PurgeSummary};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // Column layout matches files written by earlier releases, which
            // never set user_version; IF NOT EXISTS lets those open as-is.
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT,
                    food TEXT,
                    carbs REAL,
                    protein REAL,
                    fat REAL
                );

                CREATE TABLE IF NOT EXISTS daily_weight (
                    date TEXT PRIMARY KEY,
                    weight REAL
                );

                CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let s: String = row.get(idx)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    // Expects columns: 0: id, 1: date, 2: food, 3: carbs, 4: protein, 5: fat
    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealEntry> {
        Ok(MealEntry {
            id: row.get(0)?,
            date: Self::date_column(row, 1)?,
            food: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            carbs: row.get::<_, Option<f64>>(3)?.unwrap_or_default(),
            protein: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
            fat: row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
        })
    }

    fn weight_from_row(row: &rusqlite::Row) -> rusqlite::Result<DailyWeightRecord> {
        Ok(DailyWeightRecord {
            date: Self::date_column(row, 0)?,
            weight: row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
        })
    }

    // --- Meals ---

    pub fn insert_meal(&self, entry: &NewMealEntry) -> Result<MealEntry> {
        let date_str = entry.date.format(DATE_FORMAT).to_string();
        self.conn.execute(
            "INSERT INTO meals (date, food, carbs, protein, fat)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![date_str, entry.food, entry.carbs, entry.protein, entry.fat],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_meal(id)
    }

    pub fn get_meal(&self, id: i64) -> Result<MealEntry> {
        self.conn
            .query_row(
                "SELECT id, date, food, carbs, protein, fat FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .context("Meal entry not found")
    }

    pub fn get_meals_for_date(&self, date: NaiveDate) -> Result<Vec<MealEntry>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, date, food, carbs, protein, fat
             FROM meals
             WHERE date = ?1
             ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![date_str], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_meal(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM meals WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn count_meals(&self) -> Result<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM meals", [], |row| row.get(0))?;
        Ok(n)
    }

    // --- Daily weight ---

    pub fn upsert_weight(&self, date: NaiveDate, weight: f64) -> Result<DailyWeightRecord> {
        let date_str = date.format(DATE_FORMAT).to_string();
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_weight (date, weight) VALUES (?1, ?2)",
            params![date_str, weight],
        )?;
        self.get_weight(date)?
            .context("Weight record not found after upsert")
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<DailyWeightRecord>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let record = self
            .conn
            .query_row(
                "SELECT date, weight FROM daily_weight WHERE date = ?1",
                params![date_str],
                Self::weight_from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub fn count_weights(&self) -> Result<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM daily_weight", [], |row| row.get(0))?;
        Ok(n)
    }

    // --- Retention ---

    /// Delete every meal and weight row not dated `keep`.
    pub fn purge_except(&self, keep: NaiveDate) -> Result<PurgeSummary> {
        let date_str = keep.format(DATE_FORMAT).to_string();
        let tx = self.conn.unchecked_transaction()?;
        // `IS NOT` so rows with a NULL date are purged too
        let meals_deleted = tx.execute(
            "DELETE FROM meals WHERE date IS NOT ?1",
            params![date_str],
        )?;
        let weights_deleted = tx.execute(
            "DELETE FROM daily_weight WHERE date IS NOT ?1",
            params![date_str],
        )?;
        tx.commit().context("Failed to commit purge")?;
        Ok(PurgeSummary {
            meals_deleted,
            weights_deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn rice(date: NaiveDate) -> NewMealEntry {
        NewMealEntry {
            date,
            food: "rice".to_string(),
            carbs: 50.0,
            protein: 5.0,
            fat: 0.0,
        }
    }

    #[test]
    fn test_insert_and_get_meal() {
        let db = Database::open_in_memory().unwrap();
        let entry = db.insert_meal(&rice(day(15))).unwrap();

        assert_eq!(entry.food, "rice");
        assert_eq!(entry.date, day(15));
        assert!((entry.carbs - 50.0).abs() < f64::EPSILON);
        assert!((entry.calories() - 220.0).abs() < f64::EPSILON);

        let fetched = db.get_meal(entry.id).unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn test_ids_are_unique() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_meal(&rice(day(15))).unwrap();
        let b = db.insert_meal(&rice(day(15))).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_get_meal_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_meal(42).is_err());
    }

    #[test]
    fn test_delete_meal() {
        let db = Database::open_in_memory().unwrap();
        let entry = db.insert_meal(&rice(day(15))).unwrap();

        assert!(db.delete_meal(entry.id).unwrap());
        // Deleting again should return false
        assert!(!db.delete_meal(entry.id).unwrap());
    }

    #[test]
    fn test_get_meals_for_date() {
        let db = Database::open_in_memory().unwrap();
        let first = db.insert_meal(&rice(day(15))).unwrap();
        db.insert_meal(&rice(day(16))).unwrap();
        let second = db.insert_meal(&rice(day(15))).unwrap();

        let entries = db.get_meals_for_date(day(15)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first.id);
        assert_eq!(entries[1].id, second.id);

        assert!(db.get_meals_for_date(day(17)).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_weight_overwrites() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_weight(day(15)).unwrap().is_none());

        db.upsert_weight(day(15), 70.0).unwrap();
        let record = db.upsert_weight(day(15), 71.5).unwrap();
        assert!((record.weight - 71.5).abs() < f64::EPSILON);
        assert_eq!(db.count_weights().unwrap(), 1);

        let fetched = db.get_weight(day(15)).unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[test]
    fn test_purge_except() {
        let db = Database::open_in_memory().unwrap();
        db.insert_meal(&rice(day(14))).unwrap();
        db.insert_meal(&rice(day(14))).unwrap();
        let kept = db.insert_meal(&rice(day(15))).unwrap();
        db.upsert_weight(day(14), 70.0).unwrap();
        db.upsert_weight(day(15), 71.0).unwrap();

        let summary = db.purge_except(day(15)).unwrap();
        assert_eq!(summary.meals_deleted, 2);
        assert_eq!(summary.weights_deleted, 1);

        assert_eq!(db.count_meals().unwrap(), 1);
        assert_eq!(db.get_meal(kept.id).unwrap().id, kept.id);
        assert!(db.get_weight(day(14)).unwrap().is_none());
        assert!(db.get_weight(day(15)).unwrap().is_some());
    }

    #[test]
    fn test_purge_nothing_to_do() {
        let db = Database::open_in_memory().unwrap();
        db.insert_meal(&rice(day(15))).unwrap();
        let summary = db.purge_except(day(15)).unwrap();
        assert_eq!(summary, PurgeSummary::default());
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.insert_meal(&rice(day(15))).unwrap();
        db.migrate().unwrap();
        assert_eq!(db.count_meals().unwrap(), 1);
    }

    #[test]
    fn test_opens_legacy_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT, food TEXT, carbs REAL, protein REAL, fat REAL
                );
                CREATE TABLE daily_weight (date TEXT PRIMARY KEY, weight REAL);
                INSERT INTO meals (date, food, carbs, protein, fat)
                    VALUES ('2024-06-15', 'oats', 30.0, 6.0, 3.0);
                INSERT INTO daily_weight (date, weight) VALUES ('2024-06-15', 68.0);",
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let entries = db.get_meals_for_date(day(15)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].food, "oats");
        let weight = db.get_weight(day(15)).unwrap().unwrap();
        assert!((weight.weight - 68.0).abs() < f64::EPSILON);
    }
}
