//! Food item model
//!
//! Canonical nutrient profiles per 100g/100ml. Reference data: authored by
//! catalog maintainers, never derived.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::NutrientProfile;

/// A food item with its per-100g/100ml nutrient profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub profile: NutrientProfile,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCreate {
    pub name: String,
    pub category: Option<String>,
    #[serde(flatten)]
    pub profile: NutrientProfile,
}

impl FoodItem {
    /// Create a FoodItem from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: row.get("category")?,
            profile: NutrientProfile {
                energy: row.get("energy")?,
                protein: row.get("protein")?,
                carbohydrates: row.get("carbohydrates")?,
                sugars: row.get("sugars")?,
                fiber: row.get("fiber")?,
                total_fat: row.get("total_fat")?,
                saturated_fat: row.get("saturated_fat")?,
                monounsaturated_fat: row.get("monounsaturated_fat")?,
                polyunsaturated_fat: row.get("polyunsaturated_fat")?,
                trans_fat: row.get("trans_fat")?,
                cholesterol: row.get("cholesterol")?,
                vitamin_a: row.get("vitamin_a")?,
                vitamin_c: row.get("vitamin_c")?,
                vitamin_d: row.get("vitamin_d")?,
                vitamin_e: row.get("vitamin_e")?,
                vitamin_k: row.get("vitamin_k")?,
                thiamin: row.get("thiamin")?,
                riboflavin: row.get("riboflavin")?,
                niacin: row.get("niacin")?,
                vitamin_b6: row.get("vitamin_b6")?,
                vitamin_b12: row.get("vitamin_b12")?,
                folate: row.get("folate")?,
                sodium: row.get("sodium")?,
                potassium: row.get("potassium")?,
                calcium: row.get("calcium")?,
                phosphorus: row.get("phosphorus")?,
                magnesium: row.get("magnesium")?,
                iron: row.get("iron")?,
                zinc: row.get("zinc")?,
                copper: row.get("copper")?,
                selenium: row.get("selenium")?,
                alcohol: row.get("alcohol")?,
            },
            active: row.get::<_, i32>("active")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new food item
    pub fn create(conn: &Connection, data: &FoodItemCreate) -> DbResult<Self> {
        let p = &data.profile;
        conn.execute(
            r#"
            INSERT INTO food_items (
                name, category,
                energy, protein, carbohydrates, sugars, fiber,
                total_fat, saturated_fat, monounsaturated_fat, polyunsaturated_fat, trans_fat,
                cholesterol,
                vitamin_a, vitamin_c, vitamin_d, vitamin_e, vitamin_k,
                thiamin, riboflavin, niacin, vitamin_b6, vitamin_b12, folate,
                sodium, potassium, calcium, phosphorus, magnesium,
                iron, zinc, copper, selenium, alcohol
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34
            )
            "#,
            params![
                data.name,
                data.category,
                p.energy,
                p.protein,
                p.carbohydrates,
                p.sugars,
                p.fiber,
                p.total_fat,
                p.saturated_fat,
                p.monounsaturated_fat,
                p.polyunsaturated_fat,
                p.trans_fat,
                p.cholesterol,
                p.vitamin_a,
                p.vitamin_c,
                p.vitamin_d,
                p.vitamin_e,
                p.vitamin_k,
                p.thiamin,
                p.riboflavin,
                p.niacin,
                p.vitamin_b6,
                p.vitamin_b12,
                p.folate,
                p.sodium,
                p.potassium,
                p.calcium,
                p.phosphorus,
                p.magnesium,
                p.iron,
                p.zinc,
                p.copper,
                p.selenium,
                p.alcohol,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of all active food items, for the name-match pipeline
    pub fn list_active_names(conn: &Connection) -> DbResult<Vec<(i64, String)>> {
        let mut stmt =
            conn.prepare("SELECT id, name FROM food_items WHERE active = 1 ORDER BY name")?;

        let names = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names)
    }

    /// List food items with optional category filter
    pub fn list(
        conn: &Connection,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (sql, category_param) = match category {
            Some(c) => (
                "SELECT * FROM food_items WHERE category = ?1 AND active = 1 ORDER BY name LIMIT ?2 OFFSET ?3",
                Some(c.to_string()),
            ),
            None => (
                "SELECT * FROM food_items WHERE active = 1 ORDER BY name LIMIT ?1 OFFSET ?2",
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;

        let items = if let Some(category) = category_param {
            stmt.query_map(params![category, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(items)
    }

    /// Count active food items
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM food_items WHERE active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
