//! Image analysis model
//!
//! Persisted results of the vision-model food analysis. Rows are written
//! once per analysis request and never mutated.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A stored image analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysisRecord {
    pub id: i64,
    pub person_id: i64,
    pub image_ref: String,
    pub display_name: String,
    pub renal_compatible: bool,
    /// The full normalized analysis payload
    pub result: serde_json::Value,
    pub analyzed_at: String,
}

impl ImageAnalysisRecord {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let result_json: String = row.get("result_json")?;
        Ok(Self {
            id: row.get("id")?,
            person_id: row.get("person_id")?,
            image_ref: row.get("image_ref")?,
            display_name: row.get("display_name")?,
            renal_compatible: row.get::<_, i32>("renal_compatible")? != 0,
            result: serde_json::from_str(&result_json).unwrap_or(serde_json::Value::Null),
            analyzed_at: row.get("analyzed_at")?,
        })
    }

    /// Persist an analysis result
    pub fn create(
        conn: &Connection,
        person_id: i64,
        image_ref: &str,
        display_name: &str,
        renal_compatible: bool,
        result: &serde_json::Value,
    ) -> DbResult<Self> {
        let result_json = serde_json::to_string(result)
            .unwrap_or_else(|_| "null".to_string());

        conn.execute(
            r#"
            INSERT INTO image_analyses (person_id, image_ref, display_name, renal_compatible, result_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                person_id,
                image_ref,
                display_name,
                renal_compatible as i32,
                result_json,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an analysis by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM image_analyses WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List analyses for a person, newest first
    pub fn list_for_person(
        conn: &Connection,
        person_id: i64,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM image_analyses
            WHERE person_id = ?1
            ORDER BY analyzed_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let records = stmt
            .query_map(params![person_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
