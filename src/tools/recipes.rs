//! Recipe tools
//!
//! Recipe management plus per-recipe nutrient totals and the declared-flag
//! reconciliation check.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    DietaryFlags, FoodItem, MeasurementUnit, NutrientTotals, Recipe, RecipeCreate,
    RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail, RecipeKind,
};
use crate::nutrition::aggregate::{
    aggregate_recipe, reconcile_flags, AggregationWarning, FlagMismatch, IngredientPortion,
    RecipeContents,
};
use crate::nutrition::restrictions::resolve_bounds;

use super::restrictions::load_bounds_by_name;

/// Restriction used as the reference for flag reconciliation
const FLAG_REFERENCE_RESTRICTION: &str = "renal-safe";

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Response for add_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub quantity: f64,
    pub unit_id: Option<i64>,
}

/// Full recipe detail with computed totals
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub preparation: String,
    pub kind: RecipeKind,
    pub flags: DietaryFlags,
    pub ingredients: Vec<RecipeIngredientDetail>,
    pub totals: NutrientTotals,
    pub warnings: Vec<AggregationWarning>,
    /// Declared flags contradicted by the computed totals
    pub flag_warnings: Vec<FlagMismatch>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub kind: RecipeKind,
    pub flags: DietaryFlags,
    pub ingredient_count: usize,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
}

/// Create a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        created_at: recipe.created_at,
    })
}

/// Add an ingredient to a recipe
pub fn add_recipe_ingredient(
    db: &Database,
    data: RecipeIngredientCreate,
) -> Result<AddIngredientResponse, String> {
    if data.quantity < 0.0 || !data.quantity.is_finite() {
        return Err(format!("Invalid ingredient quantity: {}", data.quantity));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    // Validate recipe exists
    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", data.recipe_id));
    }

    // Validate food item exists
    let food_item = FoodItem::get_by_id(&conn, data.food_item_id)
        .map_err(|e| format!("Database error checking food item: {}", e))?;
    if food_item.is_none() {
        return Err(format!("Food item not found with id: {}", data.food_item_id));
    }

    // Validate unit when given
    if let Some(unit_id) = data.unit_id {
        let unit = MeasurementUnit::get_by_id(&conn, unit_id)
            .map_err(|e| format!("Database error checking unit: {}", e))?;
        if unit.is_none() {
            return Err(format!("Measurement unit not found with id: {}", unit_id));
        }
    }

    // One row per food item per recipe
    let existing = RecipeIngredient::get_for_recipe(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking existing ingredients: {}", e))?;
    if existing.iter().any(|i| i.food_item_id == data.food_item_id) {
        return Err(format!(
            "Food item {} is already an ingredient in recipe {}",
            data.food_item_id, data.recipe_id
        ));
    }

    let ingredient = RecipeIngredient::create(&conn, &data)
        .map_err(|e| format!("Failed to add ingredient: {}", e))?;

    Ok(AddIngredientResponse {
        id: ingredient.id,
        recipe_id: ingredient.recipe_id,
        food_item_id: ingredient.food_item_id,
        quantity: ingredient.quantity,
        unit_id: ingredient.unit_id,
    })
}

/// Remove an ingredient from a recipe
pub fn remove_recipe_ingredient(db: &Database, id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    RecipeIngredient::delete(&conn, id).map_err(|e| format!("Failed to remove ingredient: {}", e))
}

/// Get a recipe with computed totals and flag reconciliation
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = match Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
    {
        Some(recipe) => recipe,
        None => return Ok(None),
    };

    let ingredients = RecipeIngredient::get_details_for_recipe(&conn, id)
        .map_err(|e| format!("Failed to get ingredients: {}", e))?;

    let contents = load_recipe_contents(db, &recipe)?;
    let (raw_totals, warnings) = aggregate_recipe(&contents);
    let totals = raw_totals.rounded();

    // Compare declared flags against the computed totals when the reference
    // restriction is seeded; otherwise skip the check silently
    let flag_warnings = match load_bounds_by_name(db, FLAG_REFERENCE_RESTRICTION)? {
        Some(rows) => reconcile_flags(&recipe.flags, &totals, &resolve_bounds(&rows)),
        None => Vec::new(),
    };

    Ok(Some(RecipeDetail {
        id: recipe.id,
        name: recipe.name,
        preparation: recipe.preparation,
        kind: recipe.kind,
        flags: recipe.flags,
        ingredients,
        totals,
        warnings,
        flag_warnings,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    }))
}

/// List recipes
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn).map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::new();
    for recipe in recipes {
        let ingredients = RecipeIngredient::get_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to get ingredients: {}", e))?;

        summaries.push(RecipeSummary {
            id: recipe.id,
            name: recipe.name,
            kind: recipe.kind,
            flags: recipe.flags,
            ingredient_count: ingredients.len(),
        });
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
    })
}

/// Load a recipe's ingredients into an aggregation snapshot
///
/// Missing food or unit references become partial portions; the aggregator
/// records them as warnings rather than failing.
pub fn load_recipe_contents(db: &Database, recipe: &Recipe) -> Result<RecipeContents, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let rows = RecipeIngredient::get_for_recipe(&conn, recipe.id)
        .map_err(|e| format!("Failed to get ingredients: {}", e))?;

    let mut ingredients = Vec::with_capacity(rows.len());
    for row in rows {
        let food = FoodItem::get_by_id(&conn, row.food_item_id)
            .map_err(|e| format!("Database error loading food item: {}", e))?;

        let unit_factor = match row.unit_id {
            Some(unit_id) => MeasurementUnit::get_by_id(&conn, unit_id)
                .map_err(|e| format!("Database error loading unit: {}", e))?
                .map(|u| u.factor()),
            None => None,
        };

        ingredients.push(IngredientPortion {
            food_name: food.as_ref().map(|f| f.name.clone()),
            profile: food.map(|f| f.profile),
            quantity: Some(row.quantity),
            unit_factor,
        });
    }

    Ok(RecipeContents {
        recipe_id: recipe.id,
        name: recipe.name.clone(),
        ingredients,
    })
}
