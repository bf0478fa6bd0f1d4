//! Meal plan (minuta) model
//!
//! A plan is a week of day-of-week x meal-slot entries, each a free-text
//! description or a recipe reference, plus declared dietary flags and the
//! restrictions attached to the plan.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::person::Sex;
use super::medical_profile::DialysisModality;
use super::recipe::DietaryFlags;

/// Meal slot within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    #[default]
    Unspecified,
}

impl MealKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealKind::Breakfast => "breakfast",
            MealKind::Lunch => "lunch",
            MealKind::Dinner => "dinner",
            MealKind::Snack => "snack",
            MealKind::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "breakfast" => MealKind::Breakfast,
            "lunch" => MealKind::Lunch,
            "dinner" => MealKind::Dinner,
            "snack" => MealKind::Snack,
            _ => MealKind::Unspecified,
        }
    }
}

/// Day of week for plan details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monday" => Some(DayOfWeek::Monday),
            "tuesday" => Some(DayOfWeek::Tuesday),
            "wednesday" => Some(DayOfWeek::Wednesday),
            "thursday" => Some(DayOfWeek::Thursday),
            "friday" => Some(DayOfWeek::Friday),
            "saturday" => Some(DayOfWeek::Saturday),
            "sunday" => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }
}

/// A meal plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub name: String,
    pub target_sex: Option<Sex>,
    pub flags: DietaryFlags,
    pub target_calories: Option<f64>,
    pub dialysis: Option<DialysisModality>,
    pub created_at: String,
    pub updated_at: String,
}

/// A single plan entry: day x meal slot, free text or recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanDetail {
    pub id: i64,
    pub plan_id: i64,
    pub day_of_week: Option<DayOfWeek>,
    pub meal_kind: MealKind,
    pub recipe_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: String,
}

/// Data for creating a meal plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanCreate {
    pub name: String,
    pub target_sex: Option<Sex>,
    #[serde(default)]
    pub flags: DietaryFlags,
    pub target_calories: Option<f64>,
    pub dialysis: Option<DialysisModality>,
}

/// Data for adding a plan detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanDetailCreate {
    pub plan_id: i64,
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub meal_kind: MealKind,
    pub recipe_id: Option<i64>,
    pub description: Option<String>,
}

impl MealPlan {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            target_sex: row
                .get::<_, Option<String>>("target_sex")?
                .map(|s| Sex::from_str(&s)),
            flags: DietaryFlags {
                low_sodium: row.get::<_, i32>("low_sodium")? != 0,
                low_potassium: row.get::<_, i32>("low_potassium")? != 0,
                low_phosphorus: row.get::<_, i32>("low_phosphorus")? != 0,
                low_protein: row.get::<_, i32>("low_protein")? != 0,
            },
            target_calories: row.get("target_calories")?,
            dialysis: row
                .get::<_, Option<String>>("dialysis")?
                .map(|s| DialysisModality::from_str(&s)),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new meal plan
    pub fn create(conn: &Connection, data: &MealPlanCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO meal_plans (
                name, target_sex, low_sodium, low_potassium, low_phosphorus, low_protein,
                target_calories, dialysis
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.name,
                data.target_sex.map(|s| s.as_str()),
                data.flags.low_sodium as i32,
                data.flags.low_potassium as i32,
                data.flags.low_phosphorus as i32,
                data.flags.low_protein as i32,
                data.target_calories,
                data.dialysis.map(|d| d.as_str()),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a meal plan by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_plans WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List meal plans
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM meal_plans ORDER BY name LIMIT ?1 OFFSET ?2")?;

        let plans = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    /// IDs of the restrictions attached to a plan
    pub fn restriction_ids(conn: &Connection, plan_id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT restriction_id FROM meal_plan_restrictions WHERE plan_id = ?1 ORDER BY restriction_id",
        )?;

        let ids = stmt
            .query_map([plan_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    /// Attach a restriction to a plan (idempotent)
    pub fn attach_restriction(conn: &Connection, plan_id: i64, restriction_id: i64) -> DbResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO meal_plan_restrictions (plan_id, restriction_id) VALUES (?1, ?2)",
            params![plan_id, restriction_id],
        )?;
        Ok(())
    }
}

impl MealPlanDetail {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            day_of_week: row
                .get::<_, Option<String>>("day_of_week")?
                .and_then(|s| DayOfWeek::from_str(&s)),
            meal_kind: MealKind::from_str(row.get::<_, String>("meal_kind")?.as_str()),
            recipe_id: row.get("recipe_id")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Add an entry to a plan
    pub fn create(conn: &Connection, data: &MealPlanDetailCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO meal_plan_details (plan_id, day_of_week, meal_kind, recipe_id, description)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.plan_id,
                data.day_of_week.map(|d| d.as_str()),
                data.meal_kind.as_str(),
                data.recipe_id,
                data.description,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let mut stmt = conn.prepare("SELECT * FROM meal_plan_details WHERE id = ?1")?;
        stmt.query_row([id], Self::from_row).map_err(Into::into)
    }

    /// Get all entries for a plan
    pub fn get_for_plan(conn: &Connection, plan_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM meal_plan_details WHERE plan_id = ?1 ORDER BY id")?;

        let details = stmt
            .query_map([plan_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }
}
