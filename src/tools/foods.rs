//! Food catalog tools
//!
//! Measurement units, food items, the fuzzy name search used for detected
//! foods, and portion math.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    FoodItem, FoodItemCreate, MeasurementUnit, MeasurementUnitCreate, NutrientTotals,
};
use crate::nutrition::profile::nutrients_for_quantity;
use crate::nutrition::similarity::{FoodMatcher, MatchKind, NameMatch};

/// Response for add_measurement_unit
#[derive(Debug, Serialize)]
pub struct AddUnitResponse {
    pub id: i64,
    pub name: String,
    pub factor: f64,
}

/// Response for list_measurement_units
#[derive(Debug, Serialize)]
pub struct ListUnitsResponse {
    pub units: Vec<UnitSummary>,
    pub count: usize,
}

/// Unit summary with its resolved scaling factor
#[derive(Debug, Serialize)]
pub struct UnitSummary {
    pub id: i64,
    pub name: String,
    pub ml_equivalence: Option<f64>,
    pub g_equivalence: Option<f64>,
    pub is_volume: bool,
    pub factor: f64,
}

/// Response for add_food_item
#[derive(Debug, Serialize)]
pub struct AddFoodItemResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A food search hit
#[derive(Debug, Serialize)]
pub struct FoodMatchResponse {
    pub id: i64,
    pub name: String,
    pub match_kind: MatchKind,
    pub score: f64,
}

/// Response for search_food_items
#[derive(Debug, Serialize)]
pub struct SearchFoodItemsResponse {
    pub query: String,
    pub matches: Vec<FoodMatchResponse>,
}

/// Response for list_food_items
#[derive(Debug, Serialize)]
pub struct ListFoodItemsResponse {
    pub items: Vec<FoodItem>,
    pub count: usize,
    pub total: i64,
}

/// Response for portion_nutrients
#[derive(Debug, Serialize)]
pub struct PortionNutrientsResponse {
    pub food_item_id: i64,
    pub food_name: String,
    pub quantity: f64,
    pub unit_name: Option<String>,
    pub totals: NutrientTotals,
}

/// Register a measurement unit
pub fn add_measurement_unit(
    db: &Database,
    data: MeasurementUnitCreate,
) -> Result<AddUnitResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Unit name cannot be empty".to_string());
    }
    if data.is_volume && data.ml_equivalence.is_none() {
        tracing::warn!(name = %data.name, "volume unit without ml equivalence will use the default factor");
    }
    if !data.is_volume && data.g_equivalence.is_none() {
        tracing::warn!(name = %data.name, "mass unit without g equivalence will use the default factor");
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let unit = MeasurementUnit::create(&conn, &data)
        .map_err(|e| format!("Failed to create unit: {}", e))?;

    Ok(AddUnitResponse {
        id: unit.id,
        factor: unit.factor(),
        name: unit.name,
    })
}

/// List all measurement units
pub fn list_measurement_units(db: &Database) -> Result<ListUnitsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let units = MeasurementUnit::list(&conn)
        .map_err(|e| format!("Failed to list units: {}", e))?;

    let units: Vec<UnitSummary> = units
        .into_iter()
        .map(|u| UnitSummary {
            id: u.id,
            factor: u.factor(),
            ml_equivalence: u.ml_equivalence,
            g_equivalence: u.g_equivalence,
            is_volume: u.is_volume,
            name: u.name,
        })
        .collect();
    let count = units.len();

    Ok(ListUnitsResponse { units, count })
}

/// Create a food item with its per-100 profile
pub fn add_food_item(db: &Database, data: FoodItemCreate) -> Result<AddFoodItemResponse, String> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Food item name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = FoodItem::create(&conn, &data)
        .map_err(|e| format!("Failed to create food item: {}", e))?;

    Ok(AddFoodItemResponse {
        id: item.id,
        name: item.name,
        created_at: item.created_at,
    })
}

/// Search food items by name
///
/// Exact match first, then substring, then the edit-distance fallback with
/// a similarity floor.
pub fn search_food_items(db: &Database, query: &str) -> Result<SearchFoodItemsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let candidates = FoodItem::list_active_names(&conn)
        .map_err(|e| format!("Failed to load food names: {}", e))?;

    let matcher = FoodMatcher::default();
    let matches: Vec<FoodMatchResponse> = matcher
        .find_matches(query, &candidates)
        .into_iter()
        .map(|NameMatch { id, name, kind, score }| FoodMatchResponse {
            id,
            name,
            match_kind: kind,
            score,
        })
        .collect();

    Ok(SearchFoodItemsResponse {
        query: query.to_string(),
        matches,
    })
}

/// Get a food item with its full profile
pub fn get_food_item(db: &Database, id: i64) -> Result<Option<FoodItem>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    FoodItem::get_by_id(&conn, id).map_err(|e| format!("Failed to get food item: {}", e))
}

/// List food items
pub fn list_food_items(
    db: &Database,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListFoodItemsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = FoodItem::list(&conn, category, limit, offset)
        .map_err(|e| format!("Failed to list food items: {}", e))?;
    let count = items.len();

    let total = FoodItem::count(&conn).map_err(|e| format!("Failed to count food items: {}", e))?;

    Ok(ListFoodItemsResponse { items, count, total })
}

/// Nutrient totals for a portion of a food item
pub fn portion_nutrients(
    db: &Database,
    food_item_id: i64,
    quantity: f64,
    unit_id: Option<i64>,
) -> Result<PortionNutrientsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = FoodItem::get_by_id(&conn, food_item_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Food item not found with id: {}", food_item_id))?;

    let unit = match unit_id {
        Some(unit_id) => Some(
            MeasurementUnit::get_by_id(&conn, unit_id)
                .map_err(|e| format!("Database error: {}", e))?
                .ok_or_else(|| format!("Measurement unit not found with id: {}", unit_id))?,
        ),
        None => None,
    };

    let totals = nutrients_for_quantity(&item.profile, quantity, unit.as_ref())
        .map_err(|e| e.to_string())?;

    Ok(PortionNutrientsResponse {
        food_item_id,
        food_name: item.name,
        quantity,
        unit_name: unit.map(|u| u.name),
        totals,
    })
}
