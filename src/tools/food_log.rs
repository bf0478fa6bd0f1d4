//! Food log tools
//!
//! Consumption logging with totals computed at write time, and per-day
//! intake summaries with a compliance verdict.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    DailyIntake, FoodItem, FoodLogEntry, FoodLogEntryCreate, MeasurementUnit, NutrientTotals,
    Person,
};
use crate::nutrition::profile::nutrients_for_quantity;
use crate::nutrition::restrictions::{evaluate, resolve_bounds, ComplianceReport};

use super::restrictions::load_bounds_by_name;

/// Restriction evaluated in daily summaries
const DAILY_REFERENCE_RESTRICTION: &str = "renal-safe";

/// Response for log_food
#[derive(Debug, Serialize)]
pub struct LogFoodResponse {
    pub id: i64,
    pub person_id: i64,
    pub food_name: String,
    pub quantity: f64,
    pub unit_name: Option<String>,
    pub consumed_at: String,
    pub totals: NutrientTotals,
}

/// Response for list_food_log
#[derive(Debug, Serialize)]
pub struct ListFoodLogResponse {
    pub entries: Vec<FoodLogEntry>,
    pub count: usize,
}

/// One day's intake with its compliance verdict
#[derive(Debug, Serialize)]
pub struct DailyIntakeWithCompliance {
    #[serde(flatten)]
    pub intake: DailyIntake,
    /// None when the reference restriction is not seeded
    pub compliance: Option<ComplianceReport>,
}

/// Response for daily_intake
#[derive(Debug, Serialize)]
pub struct DailyIntakeResponse {
    pub person_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DailyIntakeWithCompliance>,
}

/// Log a consumed food portion
///
/// The portion's totals are computed here, once, and cached on the entry;
/// the entry is immutable afterwards except for its notes.
pub fn log_food(db: &Database, data: FoodLogEntryCreate) -> Result<LogFoodResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let person = Person::get_by_id(&conn, data.person_id)
        .map_err(|e| format!("Database error checking person: {}", e))?;
    if person.is_none() {
        return Err(format!("Person not found with id: {}", data.person_id));
    }

    let food = FoodItem::get_by_id(&conn, data.food_item_id)
        .map_err(|e| format!("Database error checking food item: {}", e))?
        .ok_or_else(|| format!("Food item not found with id: {}", data.food_item_id))?;

    let unit = match data.unit_id {
        Some(unit_id) => Some(
            MeasurementUnit::get_by_id(&conn, unit_id)
                .map_err(|e| format!("Database error checking unit: {}", e))?
                .ok_or_else(|| format!("Measurement unit not found with id: {}", unit_id))?,
        ),
        None => None,
    };

    // Malformed quantities are rejected here; this is the surfaced error
    // path, unlike implausible medical measurements
    let totals = nutrients_for_quantity(&food.profile, data.quantity, unit.as_ref())
        .map_err(|e| e.to_string())?;

    let entry = FoodLogEntry::create(&conn, &data, &totals)
        .map_err(|e| format!("Failed to log food: {}", e))?;

    Ok(LogFoodResponse {
        id: entry.id,
        person_id: entry.person_id,
        food_name: food.name,
        quantity: entry.quantity,
        unit_name: unit.map(|u| u.name),
        consumed_at: entry.consumed_at,
        totals,
    })
}

/// Update the notes on a log entry
pub fn update_food_log_notes(
    db: &Database,
    id: i64,
    notes: Option<&str>,
) -> Result<Option<FoodLogEntry>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    FoodLogEntry::update_notes(&conn, id, notes)
        .map_err(|e| format!("Failed to update notes: {}", e))
}

/// List log entries for a person
pub fn list_food_log(
    db: &Database,
    person_id: i64,
    limit: i64,
    offset: i64,
) -> Result<ListFoodLogResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let entries = FoodLogEntry::list_for_person(&conn, person_id, limit, offset)
        .map_err(|e| format!("Failed to list food log: {}", e))?;
    let count = entries.len();

    Ok(ListFoodLogResponse { entries, count })
}

/// Per-day totals for a date range, each checked against the reference
/// restriction when it is seeded
pub fn daily_intake(
    db: &Database,
    person_id: i64,
    start_date: &str,
    end_date: &str,
) -> Result<DailyIntakeResponse, String> {
    let days = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        FoodLogEntry::daily_intake(&conn, person_id, start_date, end_date)
            .map_err(|e| format!("Failed to compute daily intake: {}", e))?
    };

    let bounds = load_bounds_by_name(db, DAILY_REFERENCE_RESTRICTION)?
        .map(|rows| resolve_bounds(&rows));

    let days = days
        .into_iter()
        .map(|intake| {
            let compliance = bounds.as_ref().map(|bounds| {
                let totals = NutrientTotals {
                    energy: intake.energy,
                    protein: intake.protein,
                    sodium: intake.sodium,
                    potassium: intake.potassium,
                    phosphorus: intake.phosphorus,
                    ..Default::default()
                };
                evaluate(&totals, bounds)
            });

            DailyIntakeWithCompliance { intake, compliance }
        })
        .collect();

    Ok(DailyIntakeResponse {
        person_id,
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        days,
    })
}
