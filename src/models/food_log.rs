//! Food log model
//!
//! Timestamped consumption records. The renal-critical totals for the
//! consumed portion are computed at write time and cached on the row;
//! entries are immutable afterwards except for the free-text notes.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::NutrientTotals;

/// A logged consumption of a food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLogEntry {
    pub id: i64,
    pub person_id: i64,
    pub food_item_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub quantity: f64,
    pub consumed_at: String,
    pub cached_energy: f64,
    pub cached_protein: f64,
    pub cached_sodium: f64,
    pub cached_potassium: f64,
    pub cached_phosphorus: f64,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Data for logging a consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLogEntryCreate {
    pub person_id: i64,
    pub food_item_id: i64,
    pub unit_id: Option<i64>,
    pub quantity: f64,
    /// Defaults to now
    pub consumed_at: Option<String>,
    pub notes: Option<String>,
}

/// Per-day sums of the cached renal-critical totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyIntake {
    pub date: String,
    pub entry_count: i64,
    pub energy: f64,
    pub protein: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub phosphorus: f64,
}

impl FoodLogEntry {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            person_id: row.get("person_id")?,
            food_item_id: row.get("food_item_id")?,
            unit_id: row.get("unit_id")?,
            quantity: row.get("quantity")?,
            consumed_at: row.get("consumed_at")?,
            cached_energy: row.get("cached_energy")?,
            cached_protein: row.get("cached_protein")?,
            cached_sodium: row.get("cached_sodium")?,
            cached_potassium: row.get("cached_potassium")?,
            cached_phosphorus: row.get("cached_phosphorus")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a log entry with precomputed totals for the portion
    pub fn create(
        conn: &Connection,
        data: &FoodLogEntryCreate,
        totals: &NutrientTotals,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO food_log_entries (
                person_id, food_item_id, unit_id, quantity, consumed_at,
                cached_energy, cached_protein, cached_sodium, cached_potassium, cached_phosphorus,
                notes
            )
            VALUES (?1, ?2, ?3, ?4, COALESCE(?5, datetime('now')), ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                data.person_id,
                data.food_item_id,
                data.unit_id,
                data.quantity,
                data.consumed_at,
                totals.energy,
                totals.protein,
                totals.sodium,
                totals.potassium,
                totals.phosphorus,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_log_entries WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List entries for a person, newest first
    pub fn list_for_person(
        conn: &Connection,
        person_id: i64,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM food_log_entries
            WHERE person_id = ?1
            ORDER BY consumed_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let entries = stmt
            .query_map(params![person_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Update only the notes (entries are otherwise immutable)
    pub fn update_notes(conn: &Connection, id: i64, notes: Option<&str>) -> DbResult<Option<Self>> {
        conn.execute(
            "UPDATE food_log_entries SET notes = ?1 WHERE id = ?2",
            params![notes, id],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Daily sums of the cached totals for a person within a date range (inclusive)
    pub fn daily_intake(
        conn: &Connection,
        person_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> DbResult<Vec<DailyIntake>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT date(consumed_at) as day,
                   COUNT(*) as entry_count,
                   SUM(cached_energy) as energy,
                   SUM(cached_protein) as protein,
                   SUM(cached_sodium) as sodium,
                   SUM(cached_potassium) as potassium,
                   SUM(cached_phosphorus) as phosphorus
            FROM food_log_entries
            WHERE person_id = ?1 AND date(consumed_at) BETWEEN ?2 AND ?3
            GROUP BY date(consumed_at)
            ORDER BY day
            "#,
        )?;

        let days = stmt
            .query_map(params![person_id, start_date, end_date], |row| {
                Ok(DailyIntake {
                    date: row.get("day")?,
                    entry_count: row.get("entry_count")?,
                    energy: row.get("energy")?,
                    protein: row.get("protein")?,
                    sodium: row.get("sodium")?,
                    potassium: row.get("potassium")?,
                    phosphorus: row.get("phosphorus")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{
        FoodItem, FoodItemCreate, MeasurementUnit, MeasurementUnitCreate, NutrientProfile,
        Person, PersonCreate, Sex,
    };
    use crate::nutrition::profile::nutrients_for_quantity;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| crate::db::migrations::run_migrations(conn)).unwrap();
        db
    }

    #[test]
    fn test_log_and_daily_intake() {
        let db = setup();

        db.with_conn(|conn| {
            let person = Person::create(
                conn,
                &PersonCreate {
                    first_name: "Maria".to_string(),
                    last_name: "Rojas".to_string(),
                    birth_date: "1979-03-02".to_string(),
                    sex: Sex::Female,
                },
            )?;

            let food = FoodItem::create(
                conn,
                &FoodItemCreate {
                    name: "White rice, cooked".to_string(),
                    category: Some("Cereals".to_string()),
                    profile: NutrientProfile {
                        energy: 130.0,
                        protein: 2.7,
                        carbohydrates: 28.0,
                        sodium: Some(1.0),
                        potassium: Some(35.0),
                        phosphorus: Some(43.0),
                        ..Default::default()
                    },
                },
            )?;

            let cup = MeasurementUnit::create(
                conn,
                &MeasurementUnitCreate {
                    name: "Cup".to_string(),
                    ml_equivalence: Some(200.0),
                    g_equivalence: None,
                    is_volume: true,
                },
            )?;

            // One cup: factor 2.0 over the per-100 profile
            let totals = nutrients_for_quantity(&food.profile, 1.0, Some(&cup)).unwrap();
            let entry = FoodLogEntry::create(
                conn,
                &FoodLogEntryCreate {
                    person_id: person.id,
                    food_item_id: food.id,
                    unit_id: Some(cup.id),
                    quantity: 1.0,
                    consumed_at: Some("2026-03-10 12:30:00".to_string()),
                    notes: None,
                },
                &totals,
            )?;

            assert_eq!(entry.cached_energy, 260.0);
            assert_eq!(entry.cached_potassium, 70.0);

            // A second entry the same day, 150g without a unit
            let totals = nutrients_for_quantity(&food.profile, 150.0, None).unwrap();
            FoodLogEntry::create(
                conn,
                &FoodLogEntryCreate {
                    person_id: person.id,
                    food_item_id: food.id,
                    unit_id: None,
                    quantity: 150.0,
                    consumed_at: Some("2026-03-10 20:00:00".to_string()),
                    notes: Some("dinner".to_string()),
                },
                &totals,
            )?;

            let days =
                FoodLogEntry::daily_intake(conn, person.id, "2026-03-10", "2026-03-10")?;
            assert_eq!(days.len(), 1);
            assert_eq!(days[0].entry_count, 2);
            assert_eq!(days[0].energy, 260.0 + 195.0);
            // 35 mg x 1.5 rounds up to whole milligrams
            assert_eq!(days[0].potassium, 70.0 + 53.0);

            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_notes_are_the_only_mutable_field() {
        let db = setup();

        db.with_conn(|conn| {
            let person = Person::create(
                conn,
                &PersonCreate {
                    first_name: "Ana".to_string(),
                    last_name: "Perez".to_string(),
                    birth_date: "1990-01-01".to_string(),
                    sex: Sex::Female,
                },
            )?;

            let food = FoodItem::create(
                conn,
                &FoodItemCreate {
                    name: "Apple".to_string(),
                    category: None,
                    profile: NutrientProfile {
                        energy: 52.0,
                        ..Default::default()
                    },
                },
            )?;

            let totals = nutrients_for_quantity(&food.profile, 100.0, None).unwrap();
            let entry = FoodLogEntry::create(
                conn,
                &FoodLogEntryCreate {
                    person_id: person.id,
                    food_item_id: food.id,
                    unit_id: None,
                    quantity: 100.0,
                    consumed_at: None,
                    notes: None,
                },
                &totals,
            )?;

            let updated = FoodLogEntry::update_notes(conn, entry.id, Some("snack"))?
                .expect("entry exists");
            assert_eq!(updated.notes.as_deref(), Some("snack"));
            assert_eq!(updated.cached_energy, entry.cached_energy);
            assert_eq!(updated.quantity, entry.quantity);

            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_person_delete_cascades_to_log() {
        let db = setup();

        db.with_conn(|conn| {
            let person = Person::create(
                conn,
                &PersonCreate {
                    first_name: "Luis".to_string(),
                    last_name: "Soto".to_string(),
                    birth_date: "1955-07-20".to_string(),
                    sex: Sex::Male,
                },
            )?;

            let food = FoodItem::create(
                conn,
                &FoodItemCreate {
                    name: "Bread".to_string(),
                    category: None,
                    profile: NutrientProfile {
                        energy: 265.0,
                        ..Default::default()
                    },
                },
            )?;

            let totals = nutrients_for_quantity(&food.profile, 50.0, None).unwrap();
            let entry = FoodLogEntry::create(
                conn,
                &FoodLogEntryCreate {
                    person_id: person.id,
                    food_item_id: food.id,
                    unit_id: None,
                    quantity: 50.0,
                    consumed_at: None,
                    notes: None,
                },
                &totals,
            )?;

            assert!(Person::delete(conn, person.id)?);
            assert!(FoodLogEntry::get_by_id(conn, entry.id)?.is_none());

            Ok(())
        })
        .unwrap();
    }
}
