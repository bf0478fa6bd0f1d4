//! Dietary restriction models
//!
//! A restriction is a named set of per-nutrient min/max bounds. Restrictions
//! are shared reference data; meal plans link to them many-to-many.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::NutrientCode;

/// A nutrient the catalog knows about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientCodeRow {
    pub id: i64,
    pub code: NutrientCode,
    pub name: String,
    pub unit: Option<String>,
}

/// A named dietary restriction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietaryRestriction {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// A single bound row: nutrient x optional min/max
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionBoundRow {
    pub id: i64,
    pub restriction_id: i64,
    pub nutrient_code: NutrientCode,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl NutrientCodeRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            code: NutrientCode::from_str(row.get::<_, String>("code")?.as_str()),
            name: row.get("name")?,
            unit: row.get("unit")?,
        })
    }

    /// Register a nutrient code (idempotent on the code)
    pub fn ensure(
        conn: &Connection,
        code: NutrientCode,
        name: &str,
        unit: Option<&str>,
    ) -> DbResult<Self> {
        conn.execute(
            "INSERT OR IGNORE INTO nutrient_codes (code, name, unit) VALUES (?1, ?2, ?3)",
            params![code.as_str(), name, unit],
        )?;

        let mut stmt = conn.prepare("SELECT * FROM nutrient_codes WHERE code = ?1")?;
        stmt.query_row([code.as_str()], Self::from_row)
            .map_err(Into::into)
    }

    /// List all nutrient codes
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrient_codes ORDER BY code")?;

        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl DietaryRestriction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Insert a new restriction
    pub fn create(conn: &Connection, name: &str, description: Option<&str>) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO restrictions (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a restriction by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM restrictions WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(restriction) => Ok(Some(restriction)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a restriction by name
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM restrictions WHERE name = ?1")?;

        let result = stmt.query_row([name], Self::from_row);
        match result {
            Ok(restriction) => Ok(Some(restriction)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all restrictions
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM restrictions ORDER BY name")?;

        let restrictions = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(restrictions)
    }
}

impl RestrictionBoundRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            restriction_id: row.get("restriction_id")?,
            nutrient_code: NutrientCode::from_str(row.get::<_, String>("code")?.as_str()),
            min_value: row.get("min_value")?,
            max_value: row.get("max_value")?,
        })
    }

    /// Add or replace a bound on a restriction
    pub fn upsert(
        conn: &Connection,
        restriction_id: i64,
        nutrient_code_id: i64,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO restriction_bounds (restriction_id, nutrient_code_id, min_value, max_value)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(restriction_id, nutrient_code_id) DO UPDATE SET
                min_value = excluded.min_value,
                max_value = excluded.max_value
            "#,
            params![restriction_id, nutrient_code_id, min_value, max_value],
        )?;
        Ok(())
    }

    /// All bounds for a set of restrictions (the union the engine evaluates)
    pub fn get_for_restrictions(
        conn: &Connection,
        restriction_ids: &[i64],
    ) -> DbResult<Vec<Self>> {
        if restriction_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids_str = restriction_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let sql = format!(
            r#"
            SELECT rb.id, rb.restriction_id, nc.code, rb.min_value, rb.max_value
            FROM restriction_bounds rb
            INNER JOIN nutrient_codes nc ON rb.nutrient_code_id = nc.id
            WHERE rb.restriction_id IN ({})
            ORDER BY rb.id
            "#,
            ids_str
        );

        let mut stmt = conn.prepare(&sql)?;

        let bounds = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bounds)
    }
}
