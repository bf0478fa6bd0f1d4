//! RDM MCP Server Implementation
//!
//! Implements the MCP server with all RDM tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    FoodItemCreate, FoodLogEntryCreate, MealPlanCreate, MealPlanDetailCreate,
    MeasurementUnitCreate, MedicalProfileUpsert, PersonCreate, RecipeCreate,
    RecipeIngredientCreate,
};
use crate::nutrition::aggregate::Grouping;
use crate::tools::analysis;
use crate::tools::food_log;
use crate::tools::foods;
use crate::tools::plans;
use crate::tools::profile;
use crate::tools::recipes;
use crate::tools::reports;
use crate::tools::restrictions;
use crate::tools::status::{StatusTracker, RENAL_INSTRUCTIONS};
use crate::vision::{VisionClient, VisionConfig};

/// RDM MCP Service
#[derive(Clone)]
pub struct RdmService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    vision_client: Arc<VisionClient>,
    tool_router: ToolRouter<RdmService>,
}

impl RdmService {
    pub fn new(database_path: PathBuf, database: Database, vision_config: VisionConfig) -> Self {
        let vision_configured = vision_config.api_key.is_some();
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(
                database_path,
                vision_configured,
            ))),
            database,
            vision_client: Arc::new(VisionClient::new(vision_config)),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Person / Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPersonParams {
    pub first_name: String,
    pub last_name: String,
    /// ISO date: YYYY-MM-DD
    pub birth_date: String,
    /// male, female, or unspecified
    pub sex: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPersonParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPersonsParams {
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdatePersonParams {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// ISO date: YYYY-MM-DD; the derived age follows automatically
    pub birth_date: Option<String>,
    /// male, female, or unspecified
    pub sex: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeletePersonParams {
    pub id: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetMedicalProfileParams {
    pub person_id: i64,
    /// Kilograms, 0 < w < 500
    pub weight_kg: f64,
    /// Meters, 0 < h < 3
    pub height_m: f64,
    /// hemodialysis, peritoneal, or both
    pub dialysis: Option<String>,
    /// sedentary, light, moderate, high, very_high
    pub activity_level: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMedicalProfileParams {
    pub person_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComputeEnergyNeedsParams {
    pub weight_kg: f64,
    pub height_m: f64,
    pub age_years: Option<u32>,
    /// male, female, or unspecified (female formula)
    pub sex: Option<String>,
    /// sedentary, light, moderate, high, very_high
    pub activity_level: Option<String>,
    /// Apply the 10% renal reduction (default true)
    pub renal_adjustment: Option<bool>,
    /// Snap the result to the standard 1400/1600/1800/2000 tiers
    #[serde(default)]
    pub categorize: bool,
}

// ============================================================================
// Catalog Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMeasurementUnitParams {
    /// Display name, e.g. "Cup" or "Soup spoon"
    pub name: String,
    /// Milliliters per unit, for volume measures
    pub ml_equivalence: Option<f64>,
    /// Grams per unit, for mass measures
    pub g_equivalence: Option<f64>,
    /// Whether this is a volume (ml) measure; default true
    pub is_volume: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodItemParams {
    pub name: String,
    pub category: Option<String>,
    /// kcal per 100g/100ml
    pub energy: f64,
    /// grams per 100g/100ml
    pub protein: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub sugars: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub total_fat: f64,
    #[serde(default)]
    pub saturated_fat: f64,
    #[serde(default)]
    pub monounsaturated_fat: f64,
    #[serde(default)]
    pub polyunsaturated_fat: f64,
    #[serde(default)]
    pub trans_fat: f64,
    #[serde(default)]
    pub cholesterol: f64,
    pub vitamin_a: Option<f64>,
    pub vitamin_c: Option<f64>,
    pub vitamin_d: Option<f64>,
    pub vitamin_e: Option<f64>,
    pub vitamin_k: Option<f64>,
    pub thiamin: Option<f64>,
    pub riboflavin: Option<f64>,
    pub niacin: Option<f64>,
    pub vitamin_b6: Option<f64>,
    pub vitamin_b12: Option<f64>,
    pub folate: Option<f64>,
    /// Milligrams per 100g/100ml
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
    pub calcium: Option<f64>,
    pub phosphorus: Option<f64>,
    pub magnesium: Option<f64>,
    pub iron: Option<f64>,
    pub zinc: Option<f64>,
    pub copper: Option<f64>,
    pub selenium: Option<f64>,
    pub alcohol: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodItemsParams {
    pub query: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFoodItemParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodItemsParams {
    pub category: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PortionNutrientsParams {
    pub food_item_id: i64,
    /// Amount consumed; grams/ml when no unit is given
    pub quantity: f64,
    pub unit_id: Option<i64>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    #[serde(default)]
    pub preparation: String,
    /// starter, main_course, main_dish, dessert_snack
    pub kind: Option<String>,
    #[serde(default)]
    pub low_sodium: bool,
    #[serde(default)]
    pub low_potassium: bool,
    #[serde(default)]
    pub low_phosphorus: bool,
    #[serde(default)]
    pub low_protein: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientParams {
    pub recipe_id: i64,
    pub food_item_id: i64,
    pub quantity: f64,
    pub unit_id: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRecipeIngredientParams {
    /// Ingredient row ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecipeParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Name substring filter
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

// ============================================================================
// Meal Plan Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMealPlanParams {
    pub name: String,
    /// male, female, unspecified
    pub target_sex: Option<String>,
    #[serde(default)]
    pub low_sodium: bool,
    #[serde(default)]
    pub low_potassium: bool,
    #[serde(default)]
    pub low_phosphorus: bool,
    #[serde(default)]
    pub low_protein: bool,
    pub target_calories: Option<f64>,
    /// hemodialysis, peritoneal, both
    pub dialysis: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMealPlanDetailParams {
    pub plan_id: i64,
    /// monday..sunday
    pub day_of_week: Option<String>,
    /// breakfast, lunch, dinner, snack, unspecified
    pub meal_kind: Option<String>,
    pub recipe_id: Option<i64>,
    /// Free text, for entries without a recipe
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AttachPlanRestrictionParams {
    pub plan_id: i64,
    pub restriction_id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMealPlanParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AggregateMealPlanParams {
    pub plan_id: i64,
    /// "plan" (default) or "day_of_week"
    pub grouping: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EvaluateMealPlanParams {
    pub plan_id: i64,
}

// ============================================================================
// Restriction Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRestrictionParams {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRestrictionBoundParams {
    pub restriction_id: i64,
    /// Nutrient code: energy, protein, sodium, potassium, phosphorus, ...
    pub nutrient_code: String,
    /// Display name for the nutrient (defaults to the code)
    pub nutrient_name: Option<String>,
    /// Display unit: "mg", "g", "kcal"
    pub unit: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

// ============================================================================
// Food Log Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogFoodParams {
    pub person_id: i64,
    pub food_item_id: i64,
    /// Amount consumed; grams/ml when no unit is given
    pub quantity: f64,
    pub unit_id: Option<i64>,
    /// ISO timestamp; defaults to now
    pub consumed_at: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodLogNotesParams {
    pub id: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodLogParams {
    pub person_id: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DailyIntakeParams {
    pub person_id: i64,
    /// ISO date: YYYY-MM-DD (inclusive)
    pub start_date: String,
    /// ISO date: YYYY-MM-DD (inclusive)
    pub end_date: String,
}

// ============================================================================
// Analysis / Report Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeFoodImageParams {
    pub person_id: i64,
    /// Base64-encoded JPEG image data
    pub image_base64: String,
    /// Reference to where the image lives (path or URL)
    pub image_ref: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetImageAnalysisParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListImageAnalysesParams {
    pub person_id: i64,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateIntakeReportParams {
    pub person_id: i64,
    /// ISO date: YYYY-MM-DD (inclusive)
    pub start_date: String,
    /// ISO date: YYYY-MM-DD (inclusive)
    pub end_date: String,
    /// Where to write the PDF
    pub output_path: String,
    /// Optional notes printed on the chart page
    pub notes: Option<Vec<String>>,
}

// ============================================================================
// Helpers
// ============================================================================

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(entity: &str, id: i64) -> Result<CallToolResult, McpError> {
    let json = format!(r#"{{"error": "{} not found", "id": {}}}"#, entity, id);
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl RdmService {
    // --- Status ---

    #[tool(description = "Get the current status of the RDM service including build info, database status, and process information")]
    async fn rdm_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        json_result(&status)
    }

    #[tool(description = "Get step-by-step instructions for renal dietary tracking. Call this when starting a session or when unsure how to use the RDM tools.")]
    fn renal_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(RENAL_INSTRUCTIONS)]))
    }

    // --- Persons & Profiles ---

    #[tool(description = "Create a person (patient or caregiver). Age is derived from birth_date.")]
    fn set_person(&self, Parameters(p): Parameters<SetPersonParams>) -> Result<CallToolResult, McpError> {
        let data = PersonCreate {
            first_name: p.first_name,
            last_name: p.last_name,
            birth_date: p.birth_date,
            sex: p.sex.as_deref().map(crate::models::Sex::from_str).unwrap_or_default(),
        };
        let result = profile::set_person(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a person with their derived age")]
    fn get_person(&self, Parameters(p): Parameters<GetPersonParams>) -> Result<CallToolResult, McpError> {
        let result = profile::get_person(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(person) => json_result(&person),
            None => not_found("Person", p.id),
        }
    }

    #[tool(description = "List persons")]
    fn list_persons(&self, Parameters(p): Parameters<ListPersonsParams>) -> Result<CallToolResult, McpError> {
        let result = profile::list_persons(&self.database, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a person's name, birth date, sex, or active flag. The derived age follows a birth date change automatically.")]
    fn update_person(&self, Parameters(p): Parameters<UpdatePersonParams>) -> Result<CallToolResult, McpError> {
        let result = profile::update_person(
            &self.database,
            p.id,
            p.first_name.as_deref(),
            p.last_name.as_deref(),
            p.birth_date.as_deref(),
            p.sex.as_deref().map(crate::models::Sex::from_str),
            p.active,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(person) => json_result(&person),
            None => not_found("Person", p.id),
        }
    }

    #[tool(description = "Delete a person and everything they own (medical profile, food log, image analyses)")]
    fn delete_person(&self, Parameters(p): Parameters<DeletePersonParams>) -> Result<CallToolResult, McpError> {
        let deleted = profile::delete_person(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&serde_json::json!({ "deleted": deleted, "id": p.id }))
    }

    #[tool(description = "Create or replace a person's medical profile (weight, height, dialysis modality, activity level). Returns the derived BMI, daily calories, and calorie tier.")]
    fn set_medical_profile(&self, Parameters(p): Parameters<SetMedicalProfileParams>) -> Result<CallToolResult, McpError> {
        let data = MedicalProfileUpsert {
            person_id: p.person_id,
            weight_kg: p.weight_kg,
            height_m: p.height_m,
            dialysis: p.dialysis.as_deref().map(crate::models::DialysisModality::from_str).unwrap_or_default(),
            activity_level: p.activity_level.as_deref().map(crate::models::ActivityLevel::from_str).unwrap_or_default(),
        };
        let result = profile::set_medical_profile(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a person's medical profile with derived BMI, daily calories, and calorie tier. Uncomputable values come back as null with a reason.")]
    fn get_medical_profile(&self, Parameters(p): Parameters<GetMedicalProfileParams>) -> Result<CallToolResult, McpError> {
        let result = profile::get_medical_profile(&self.database, p.person_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(profile) => json_result(&profile),
            None => not_found("Medical profile", p.person_id),
        }
    }

    #[tool(description = "Compute BMI and daily caloric needs directly from measurements, without a stored profile. Uses the revised Harris-Benedict equation with the renal adjustment.")]
    fn compute_energy_needs(&self, Parameters(p): Parameters<ComputeEnergyNeedsParams>) -> Result<CallToolResult, McpError> {
        let result = profile::compute_energy_needs(
            p.weight_kg,
            p.height_m,
            p.age_years,
            p.sex.as_deref().unwrap_or("unspecified"),
            p.activity_level.as_deref().unwrap_or("sedentary"),
            p.renal_adjustment.unwrap_or(true),
            p.categorize,
        );
        json_result(&result)
    }

    // --- Catalog ---

    #[tool(description = "Register a measurement unit with a milliliter (volume) or gram (mass) equivalence")]
    fn add_measurement_unit(&self, Parameters(p): Parameters<AddMeasurementUnitParams>) -> Result<CallToolResult, McpError> {
        let data = MeasurementUnitCreate {
            name: p.name,
            ml_equivalence: p.ml_equivalence,
            g_equivalence: p.g_equivalence,
            is_volume: p.is_volume.unwrap_or(true),
        };
        let result = foods::add_measurement_unit(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List all measurement units with their resolved scaling factors")]
    fn list_measurement_units(&self) -> Result<CallToolResult, McpError> {
        let result = foods::list_measurement_units(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Create a food item with its per-100g/100ml nutrient profile. Minerals are in milligrams.")]
    fn add_food_item(&self, Parameters(p): Parameters<AddFoodItemParams>) -> Result<CallToolResult, McpError> {
        let data = FoodItemCreate {
            name: p.name,
            category: p.category,
            profile: crate::models::NutrientProfile {
                energy: p.energy,
                protein: p.protein,
                carbohydrates: p.carbohydrates,
                sugars: p.sugars,
                fiber: p.fiber,
                total_fat: p.total_fat,
                saturated_fat: p.saturated_fat,
                monounsaturated_fat: p.monounsaturated_fat,
                polyunsaturated_fat: p.polyunsaturated_fat,
                trans_fat: p.trans_fat,
                cholesterol: p.cholesterol,
                vitamin_a: p.vitamin_a,
                vitamin_c: p.vitamin_c,
                vitamin_d: p.vitamin_d,
                vitamin_e: p.vitamin_e,
                vitamin_k: p.vitamin_k,
                thiamin: p.thiamin,
                riboflavin: p.riboflavin,
                niacin: p.niacin,
                vitamin_b6: p.vitamin_b6,
                vitamin_b12: p.vitamin_b12,
                folate: p.folate,
                sodium: p.sodium,
                potassium: p.potassium,
                calcium: p.calcium,
                phosphorus: p.phosphorus,
                magnesium: p.magnesium,
                iron: p.iron,
                zinc: p.zinc,
                copper: p.copper,
                selenium: p.selenium,
                alcohol: p.alcohol,
            },
        };
        let result = foods::add_food_item(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Search food items by name: exact match first, then substring, then edit-distance fallback with a similarity floor")]
    fn search_food_items(&self, Parameters(p): Parameters<SearchFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_food_items(&self.database, &p.query)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a food item with its full per-100 nutrient profile")]
    fn get_food_item(&self, Parameters(p): Parameters<GetFoodItemParams>) -> Result<CallToolResult, McpError> {
        let result = foods::get_food_item(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(item) => json_result(&item),
            None => not_found("Food item", p.id),
        }
    }

    #[tool(description = "List food items, optionally filtered by category")]
    fn list_food_items(&self, Parameters(p): Parameters<ListFoodItemsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_food_items(&self.database, p.category.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Compute nutrient totals for a portion of a food item. Quantity is grams/ml unless a measurement unit is given.")]
    fn portion_nutrients(&self, Parameters(p): Parameters<PortionNutrientsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::portion_nutrients(&self.database, p.food_item_id, p.quantity, p.unit_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe. The low_* dietary flags are author-declared metadata, not computed from ingredients.")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            preparation: p.preparation,
            kind: p.kind.as_deref().map(crate::models::RecipeKind::from_str).unwrap_or_default(),
            flags: crate::models::DietaryFlags {
                low_sodium: p.low_sodium,
                low_potassium: p.low_potassium,
                low_phosphorus: p.low_phosphorus,
                low_protein: p.low_protein,
            },
        };
        let result = recipes::create_recipe(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add an ingredient (food item + quantity + optional unit) to a recipe")]
    fn add_recipe_ingredient(&self, Parameters(p): Parameters<AddRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientCreate {
            recipe_id: p.recipe_id,
            food_item_id: p.food_item_id,
            quantity: p.quantity,
            unit_id: p.unit_id,
        };
        let result = recipes::add_recipe_ingredient(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove an ingredient from a recipe")]
    fn remove_recipe_ingredient(&self, Parameters(p): Parameters<RemoveRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let deleted = recipes::remove_recipe_ingredient(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&serde_json::json!({ "deleted": deleted, "id": p.id }))
    }

    #[tool(description = "Get a recipe with computed nutrient totals, skipped-ingredient warnings, and flag_warnings where declared dietary flags contradict the computed totals")]
    fn get_recipe(&self, Parameters(p): Parameters<GetRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(recipe) => json_result(&recipe),
            None => not_found("Recipe", p.id),
        }
    }

    #[tool(description = "List recipes with their declared dietary flags")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Meal Plans ---

    #[tool(description = "Create a meal plan (minuta)")]
    fn create_meal_plan(&self, Parameters(p): Parameters<CreateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanCreate {
            name: p.name,
            target_sex: p.target_sex.as_deref().map(crate::models::Sex::from_str),
            flags: crate::models::DietaryFlags {
                low_sodium: p.low_sodium,
                low_potassium: p.low_potassium,
                low_phosphorus: p.low_phosphorus,
                low_protein: p.low_protein,
            },
            target_calories: p.target_calories,
            dialysis: p.dialysis.as_deref().map(crate::models::DialysisModality::from_str),
        };
        let result = plans::create_meal_plan(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add an entry to a meal plan: day-of-week x meal slot, with a recipe reference or free-text description")]
    fn add_meal_plan_detail(&self, Parameters(p): Parameters<AddMealPlanDetailParams>) -> Result<CallToolResult, McpError> {
        let data = MealPlanDetailCreate {
            plan_id: p.plan_id,
            day_of_week: p.day_of_week.as_deref().and_then(crate::models::DayOfWeek::from_str),
            meal_kind: p.meal_kind.as_deref().map(crate::models::MealKind::from_str).unwrap_or_default(),
            recipe_id: p.recipe_id,
            description: p.description,
        };
        let result = plans::add_meal_plan_detail(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Attach a dietary restriction to a meal plan (idempotent)")]
    fn attach_plan_restriction(&self, Parameters(p): Parameters<AttachPlanRestrictionParams>) -> Result<CallToolResult, McpError> {
        plans::attach_plan_restriction(&self.database, p.plan_id, p.restriction_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&serde_json::json!({
            "success": true,
            "plan_id": p.plan_id,
            "restriction_id": p.restriction_id
        }))
    }

    #[tool(description = "Get a meal plan with its entries and attached restriction IDs")]
    fn get_meal_plan(&self, Parameters(p): Parameters<GetMealPlanParams>) -> Result<CallToolResult, McpError> {
        let result = plans::get_meal_plan(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(plan) => json_result(&plan),
            None => not_found("Meal plan", p.id),
        }
    }

    #[tool(description = "Aggregate a meal plan's nutrient totals across its recipe/ingredient graph. Grouping: 'plan' (default) or 'day_of_week'. Incomplete ingredients are skipped and listed in warnings.")]
    fn aggregate_meal_plan(&self, Parameters(p): Parameters<AggregateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let grouping = match p.grouping.as_deref() {
            Some("day_of_week") => Grouping::DayOfWeek,
            _ => Grouping::Plan,
        };
        let result = plans::aggregate_meal_plan(&self.database, p.plan_id, grouping)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Evaluate a meal plan's aggregated totals against every bound of every attached restriction. Bounds are inclusive.")]
    fn evaluate_meal_plan(&self, Parameters(p): Parameters<EvaluateMealPlanParams>) -> Result<CallToolResult, McpError> {
        let result = plans::evaluate_meal_plan(&self.database, p.plan_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Restrictions ---

    #[tool(description = "Create a named dietary restriction (a set of nutrient bounds)")]
    fn add_restriction(&self, Parameters(p): Parameters<AddRestrictionParams>) -> Result<CallToolResult, McpError> {
        let result = restrictions::add_restriction(&self.database, &p.name, p.description.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Add or replace a nutrient bound on a restriction. At least one of min_value/max_value is required; min must not exceed max.")]
    fn add_restriction_bound(&self, Parameters(p): Parameters<AddRestrictionBoundParams>) -> Result<CallToolResult, McpError> {
        let result = restrictions::add_restriction_bound(
            &self.database,
            p.restriction_id,
            &p.nutrient_code,
            p.nutrient_name.as_deref(),
            p.unit.as_deref(),
            p.min_value,
            p.max_value,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List dietary restrictions with their bounds")]
    fn list_restrictions(&self) -> Result<CallToolResult, McpError> {
        let result = restrictions::list_restrictions(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List the registered nutrient codes")]
    fn list_nutrient_codes(&self) -> Result<CallToolResult, McpError> {
        let result = restrictions::list_nutrient_codes(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Food Log ---

    #[tool(description = "Log a consumed food portion for a person. Nutrient totals for the portion are computed and stored with the entry.")]
    fn log_food(&self, Parameters(p): Parameters<LogFoodParams>) -> Result<CallToolResult, McpError> {
        let data = FoodLogEntryCreate {
            person_id: p.person_id,
            food_item_id: p.food_item_id,
            unit_id: p.unit_id,
            quantity: p.quantity,
            consumed_at: p.consumed_at,
            notes: p.notes,
        };
        let result = food_log::log_food(&self.database, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update the notes on a food log entry (entries are otherwise immutable)")]
    fn update_food_log_notes(&self, Parameters(p): Parameters<UpdateFoodLogNotesParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::update_food_log_notes(&self.database, p.id, p.notes.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(entry) => json_result(&entry),
            None => not_found("Food log entry", p.id),
        }
    }

    #[tool(description = "List a person's food log entries, newest first")]
    fn list_food_log(&self, Parameters(p): Parameters<ListFoodLogParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::list_food_log(&self.database, p.person_id, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Per-day intake totals for a date range, each checked against the renal-safe restriction when it is seeded")]
    fn daily_intake(&self, Parameters(p): Parameters<DailyIntakeParams>) -> Result<CallToolResult, McpError> {
        let result = food_log::daily_intake(&self.database, p.person_id, &p.start_date, &p.end_date)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Image Analysis ---

    #[tool(description = "Analyze a food photo with the vision model: detect foods, estimate renal-critical nutrients, and evaluate them against the renal-safe restriction. On upstream failure the tool still succeeds with analysis_failed=true and fallback values.")]
    async fn analyze_food_image(&self, Parameters(p): Parameters<AnalyzeFoodImageParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::analyze_food_image(
            &self.database,
            &self.vision_client,
            p.person_id,
            &p.image_base64,
            &p.image_ref,
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a stored image analysis with its full normalized payload")]
    fn get_image_analysis(&self, Parameters(p): Parameters<GetImageAnalysisParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::get_image_analysis(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(record) => json_result(&record),
            None => not_found("Image analysis", p.id),
        }
    }

    #[tool(description = "List a person's image analyses, newest first")]
    fn list_image_analyses(&self, Parameters(p): Parameters<ListImageAnalysesParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::list_image_analyses(&self.database, p.person_id, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Reports ---

    #[tool(description = "Generate a PDF intake report for a date range: day-by-day renal-critical totals and a mineral trend chart against the restriction limits")]
    fn generate_intake_report(&self, Parameters(p): Parameters<GenerateIntakeReportParams>) -> Result<CallToolResult, McpError> {
        let result = reports::generate_intake_report(
            &self.database,
            p.person_id,
            &p.start_date,
            &p.end_date,
            &p.output_path,
            p.notes,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for RdmService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "rdm".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Renal Diet Manager".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Renal Diet Manager (RDM) - Dietary tracking for chronic kidney disease patients. \
                 IMPORTANT: Call renal_instructions before a tracking session. \
                 Persons: set/update/delete/get/list_persons, set/get_medical_profile (BMI, daily calories, tier), compute_energy_needs. \
                 Catalog: add/list_measurement_units, add/search/get/list_food_item(s), portion_nutrients. \
                 Recipes: create_recipe, add/remove_recipe_ingredient, get_recipe (totals + flag_warnings), list_recipes. \
                 Plans: create_meal_plan, add_meal_plan_detail, attach_plan_restriction, get_meal_plan, \
                 aggregate_meal_plan, evaluate_meal_plan. \
                 Restrictions: add_restriction, add_restriction_bound, list_restrictions, list_nutrient_codes. \
                 Food log: log_food, update_food_log_notes, list_food_log, daily_intake. \
                 Analysis: analyze_food_image, get_image_analysis, list_image_analyses. \
                 Reports: generate_intake_report."
                    .into(),
            ),
        }
    }
}
