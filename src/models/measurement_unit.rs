//! Measurement unit model
//!
//! Household measures carrying a volume (ml) or mass (g) equivalence, used
//! to scale per-100 nutrient values for arbitrary portions.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::units::scaling_factor;

/// A measurement unit with at most one authoritative equivalence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementUnit {
    pub id: i64,
    pub name: String,
    pub ml_equivalence: Option<f64>,
    pub g_equivalence: Option<f64>,
    pub is_volume: bool,
    pub created_at: String,
}

/// Data for creating a measurement unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementUnitCreate {
    pub name: String,
    pub ml_equivalence: Option<f64>,
    pub g_equivalence: Option<f64>,
    #[serde(default = "default_is_volume")]
    pub is_volume: bool,
}

fn default_is_volume() -> bool {
    true
}

impl MeasurementUnit {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            ml_equivalence: row.get("ml_equivalence")?,
            g_equivalence: row.get("g_equivalence")?,
            is_volume: row.get::<_, i32>("is_volume")? != 0,
            created_at: row.get("created_at")?,
        })
    }

    /// Per-100 scaling factor along the unit's own axis
    pub fn factor(&self) -> f64 {
        scaling_factor(self.ml_equivalence, self.g_equivalence, self.is_volume)
    }

    /// Insert a new measurement unit
    pub fn create(conn: &Connection, data: &MeasurementUnitCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO measurement_units (name, ml_equivalence, g_equivalence, is_volume)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.name,
                data.ml_equivalence,
                data.g_equivalence,
                data.is_volume as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a unit by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM measurement_units WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a unit by exact name
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM measurement_units WHERE name = ?1")?;

        let result = stmt.query_row([name], Self::from_row);
        match result {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all units
    pub fn list(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM measurement_units ORDER BY name")?;

        let units = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(units)
    }
}
