//! Data models
//!
//! Rust structs representing database entities.

mod food_item;
mod food_log;
mod image_analysis;
mod meal_plan;
mod measurement_unit;
mod medical_profile;
mod nutrients;
mod person;
mod recipe;
mod recipe_ingredient;
mod restriction;

pub use food_item::{FoodItem, FoodItemCreate};
pub use food_log::{DailyIntake, FoodLogEntry, FoodLogEntryCreate};
pub use image_analysis::ImageAnalysisRecord;
pub use meal_plan::{
    DayOfWeek, MealKind, MealPlan, MealPlanCreate, MealPlanDetail, MealPlanDetailCreate,
};
pub use measurement_unit::{MeasurementUnit, MeasurementUnitCreate};
pub use medical_profile::{ActivityLevel, DialysisModality, MedicalProfile, MedicalProfileUpsert};
pub use nutrients::{NutrientCode, NutrientProfile, NutrientTotals};
pub use person::{age_from_birth_date, Person, PersonCreate, Sex};
pub use recipe::{DietaryFlags, Recipe, RecipeCreate, RecipeKind};
pub use recipe_ingredient::{RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail};
pub use restriction::{DietaryRestriction, NutrientCodeRow, RestrictionBoundRow};
