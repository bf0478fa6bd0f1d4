//! Recipe ingredient model
//!
//! Junction between recipes and food items with quantity and measurement
//! unit.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A recipe ingredient linking a food item to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub quantity: f64,
    pub unit_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe ingredient with food and unit names resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub food_item_id: i64,
    pub food_item_name: String,
    pub quantity: f64,
    pub unit_id: Option<i64>,
    pub unit_name: Option<String>,
}

/// Data for adding an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub quantity: f64,
    pub unit_id: Option<i64>,
}

impl RecipeIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            food_item_id: row.get("food_item_id")?,
            quantity: row.get("quantity")?,
            unit_id: row.get("unit_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add an ingredient to a recipe
    pub fn create(conn: &Connection, data: &RecipeIngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, food_item_id, quantity, unit_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![data.recipe_id, data.food_item_id, data.quantity, data.unit_id],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all ingredients for a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY id")?;

        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Get ingredients with food and unit names for a recipe
    pub fn get_details_for_recipe(
        conn: &Connection,
        recipe_id: i64,
    ) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.id, ri.food_item_id, fi.name as food_item_name,
                   ri.quantity, ri.unit_id, mu.name as unit_name
            FROM recipe_ingredients ri
            INNER JOIN food_items fi ON ri.food_item_id = fi.id
            LEFT JOIN measurement_units mu ON ri.unit_id = mu.id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.id
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                Ok(RecipeIngredientDetail {
                    id: row.get("id")?,
                    food_item_id: row.get("food_item_id")?,
                    food_item_name: row.get("food_item_name")?,
                    quantity: row.get("quantity")?,
                    unit_id: row.get("unit_id")?,
                    unit_name: row.get("unit_name")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Remove an ingredient
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
