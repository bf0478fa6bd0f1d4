//! Recipe model
//!
//! Preparations with declared dietary flags. The flags are author-set
//! editorial metadata; they are compared against computed ingredient totals
//! only as a data-quality check, never overwritten.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Recipe kind (course classification)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecipeKind {
    Starter,
    #[default]
    MainCourse,
    MainDish,
    DessertSnack,
}

impl RecipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeKind::Starter => "starter",
            RecipeKind::MainCourse => "main_course",
            RecipeKind::MainDish => "main_dish",
            RecipeKind::DessertSnack => "dessert_snack",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "starter" => RecipeKind::Starter,
            "main_dish" => RecipeKind::MainDish,
            "dessert_snack" => RecipeKind::DessertSnack,
            _ => RecipeKind::MainCourse,
        }
    }
}

/// Declared dietary flags on a recipe or meal plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryFlags {
    #[serde(default)]
    pub low_sodium: bool,
    #[serde(default)]
    pub low_potassium: bool,
    #[serde(default)]
    pub low_phosphorus: bool,
    #[serde(default)]
    pub low_protein: bool,
}

/// A recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub preparation: String,
    pub kind: RecipeKind,
    pub flags: DietaryFlags,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default)]
    pub preparation: String,
    #[serde(default)]
    pub kind: RecipeKind,
    #[serde(default)]
    pub flags: DietaryFlags,
}

impl Recipe {
    /// Create a Recipe from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            preparation: row.get("preparation")?,
            kind: RecipeKind::from_str(row.get::<_, String>("kind")?.as_str()),
            flags: DietaryFlags {
                low_sodium: row.get::<_, i32>("low_sodium")? != 0,
                low_potassium: row.get::<_, i32>("low_potassium")? != 0,
                low_phosphorus: row.get::<_, i32>("low_phosphorus")? != 0,
                low_protein: row.get::<_, i32>("low_protein")? != 0,
            },
            active: row.get::<_, i32>("active")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new recipe
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipes (name, preparation, kind, low_sodium, low_potassium, low_phosphorus, low_protein)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.name,
                data.preparation,
                data.kind.as_str(),
                data.flags.low_sodium as i32,
                data.flags.low_potassium as i32,
                data.flags.low_phosphorus as i32,
                data.flags.low_protein as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List active recipes, optionally filtered by name substring
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (sql, pattern) = match query {
            Some(q) => (
                "SELECT * FROM recipes WHERE name LIKE ?1 AND active = 1 ORDER BY name LIMIT ?2 OFFSET ?3",
                Some(format!("%{}%", q)),
            ),
            None => (
                "SELECT * FROM recipes WHERE active = 1 ORDER BY name LIMIT ?1 OFFSET ?2",
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;

        let recipes = if let Some(pattern) = pattern {
            stmt.query_map(params![pattern, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(recipes)
    }

    /// Count active recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM recipes WHERE active = 1", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }
}
