//! Person model
//!
//! Patients and caregivers. Age is derived from the birth date at read time
//! and never stored.

use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Biological sex used by the calorie formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "male" | "m" => Sex::Male,
            "female" | "f" => Sex::Female,
            _ => Sex::Unspecified,
        }
    }
}

/// A patient or caregiver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub sex: Sex,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCreate {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    #[serde(default)]
    pub sex: Sex,
}

impl Person {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            birth_date: row.get("birth_date")?,
            sex: Sex::from_str(row.get::<_, String>("sex")?.as_str()),
            active: row.get::<_, i32>("active")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Age in whole years, derived from the birth date
    ///
    /// Returns None when the birth date does not parse; a birth date in the
    /// future clamps to zero.
    pub fn age_years(&self) -> Option<u32> {
        age_from_birth_date(&self.birth_date)
    }

    /// Insert a new person
    pub fn create(conn: &Connection, data: &PersonCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO persons (first_name, last_name, birth_date, sex)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.first_name,
                data.last_name,
                data.birth_date,
                data.sex.as_str(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a person by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM persons WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(person) => Ok(Some(person)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List persons, active first
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM persons ORDER BY active DESC, last_name, first_name LIMIT ?1 OFFSET ?2",
        )?;

        let persons = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(persons)
    }

    /// Update name, birth date, sex, or active flag
    pub fn update(
        conn: &Connection,
        id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        birth_date: Option<&str>,
        sex: Option<Sex>,
        active: Option<bool>,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(first_name) = first_name {
            updates.push(format!("first_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(first_name.to_string()));
        }
        if let Some(last_name) = last_name {
            updates.push(format!("last_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(last_name.to_string()));
        }
        if let Some(birth_date) = birth_date {
            updates.push(format!("birth_date = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(birth_date.to_string()));
        }
        if let Some(sex) = sex {
            updates.push(format!("sex = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(sex.as_str().to_string()));
        }
        if let Some(active) = active {
            updates.push(format!("active = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(active as i32));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE persons SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a person (cascades to profile, food log, and analyses)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM persons WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Compute age in whole years from an ISO birth date string
pub fn age_from_birth_date(birth_date: &str) -> Option<u32> {
    let born = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").ok()?;
    let today = Utc::now().date_naive();

    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }

    // Future birth dates clamp to zero rather than going negative
    Some(age.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_from_birth_date() {
        // Someone born ~30 years ago is 29 or 30 depending on the day
        let age = age_from_birth_date("1995-06-15").unwrap();
        assert!(age >= 29);

        // Unparseable dates give None, not a panic
        assert_eq!(age_from_birth_date("not-a-date"), None);
        assert_eq!(age_from_birth_date(""), None);
    }

    #[test]
    fn test_age_never_negative() {
        assert_eq!(age_from_birth_date("2999-01-01"), Some(0));
    }

    #[test]
    fn test_sex_from_str() {
        assert_eq!(Sex::from_str("male"), Sex::Male);
        assert_eq!(Sex::from_str("M"), Sex::Male);
        assert_eq!(Sex::from_str("female"), Sex::Female);
        assert_eq!(Sex::from_str("other"), Sex::Unspecified);
    }
}
