//! Medical profile model
//!
//! One per person: anthropometric data and treatment context feeding the
//! BMI and calorie calculations.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Dialysis modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DialysisModality {
    #[default]
    Hemodialysis,
    Peritoneal,
    Both,
}

impl DialysisModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialysisModality::Hemodialysis => "hemodialysis",
            DialysisModality::Peritoneal => "peritoneal",
            DialysisModality::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "peritoneal" => DialysisModality::Peritoneal,
            "both" => DialysisModality::Both,
            _ => DialysisModality::Hemodialysis,
        }
    }
}

/// Physical activity level
///
/// Unknown preserves the fallback-to-sedentary factor without guessing what
/// the caller meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::High => "high",
            ActivityLevel::VeryHigh => "very_high",
            ActivityLevel::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "light" => ActivityLevel::Light,
            "moderate" => ActivityLevel::Moderate,
            "high" => ActivityLevel::High,
            "very_high" | "very high" => ActivityLevel::VeryHigh,
            _ => ActivityLevel::Unknown,
        }
    }

    /// Harris-Benedict activity multiplier; unknown falls back to sedentary
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary | ActivityLevel::Unknown => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::High => 1.725,
            ActivityLevel::VeryHigh => 1.9,
        }
    }
}

/// A person's medical profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalProfile {
    pub id: i64,
    pub person_id: i64,
    pub weight_kg: f64,
    pub height_m: f64,
    pub dialysis: DialysisModality,
    pub activity_level: ActivityLevel,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating or replacing a medical profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalProfileUpsert {
    pub person_id: i64,
    pub weight_kg: f64,
    pub height_m: f64,
    #[serde(default)]
    pub dialysis: DialysisModality,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

impl MedicalProfile {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            person_id: row.get("person_id")?,
            weight_kg: row.get("weight_kg")?,
            height_m: row.get("height_m")?,
            dialysis: DialysisModality::from_str(row.get::<_, String>("dialysis")?.as_str()),
            activity_level: ActivityLevel::from_str(
                row.get::<_, String>("activity_level")?.as_str(),
            ),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Set or replace a person's profile (upsert)
    ///
    /// `updated_at` is touched on every write, including when the values are
    /// unchanged.
    pub fn upsert(conn: &Connection, data: &MedicalProfileUpsert) -> DbResult<Self> {
        // Unknown is a parse fallback, not a storable level
        let activity_level = match data.activity_level {
            ActivityLevel::Unknown => ActivityLevel::Sedentary,
            level => level,
        };

        conn.execute(
            r#"
            INSERT INTO medical_profiles (person_id, weight_kg, height_m, dialysis, activity_level)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(person_id) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                height_m = excluded.height_m,
                dialysis = excluded.dialysis,
                activity_level = excluded.activity_level,
                updated_at = datetime('now')
            "#,
            params![
                data.person_id,
                data.weight_kg,
                data.height_m,
                data.dialysis.as_str(),
                activity_level.as_str(),
            ],
        )?;

        Self::get_for_person(conn, data.person_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get the profile for a person
    pub fn get_for_person(conn: &Connection, person_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM medical_profiles WHERE person_id = ?1")?;

        let result = stmt.query_row([person_id], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_factors() {
        assert_eq!(ActivityLevel::Sedentary.factor(), 1.2);
        assert_eq!(ActivityLevel::Light.factor(), 1.375);
        assert_eq!(ActivityLevel::Moderate.factor(), 1.55);
        assert_eq!(ActivityLevel::High.factor(), 1.725);
        assert_eq!(ActivityLevel::VeryHigh.factor(), 1.9);
        // Unknown falls back to the sedentary factor
        assert_eq!(ActivityLevel::Unknown.factor(), 1.2);
    }

    #[test]
    fn test_activity_level_parsing() {
        assert_eq!(ActivityLevel::from_str("moderate"), ActivityLevel::Moderate);
        assert_eq!(ActivityLevel::from_str("very high"), ActivityLevel::VeryHigh);
        assert_eq!(ActivityLevel::from_str("extreme"), ActivityLevel::Unknown);
    }

    #[test]
    fn test_dialysis_parsing_defaults_to_hemodialysis() {
        assert_eq!(DialysisModality::from_str("peritoneal"), DialysisModality::Peritoneal);
        assert_eq!(DialysisModality::from_str("something"), DialysisModality::Hemodialysis);
    }
}
