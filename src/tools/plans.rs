//! Meal plan tools
//!
//! Plan management, nutrient aggregation across the plan's recipe graph,
//! and compliance evaluation against the plan's attached restrictions.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    DietaryFlags, MealPlan, MealPlanCreate, MealPlanDetail, MealPlanDetailCreate, Recipe,
    RestrictionBoundRow,
};
use crate::nutrition::aggregate::{aggregate_plan, Grouping, PlanAggregate, PlanEntry, PlanSnapshot};
use crate::nutrition::restrictions::{evaluate, resolve_bounds, ComplianceReport};

use super::recipes::load_recipe_contents;

/// Response for create_meal_plan
#[derive(Debug, Serialize)]
pub struct CreatePlanResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Response for add_meal_plan_detail
#[derive(Debug, Serialize)]
pub struct AddDetailResponse {
    pub id: i64,
    pub plan_id: i64,
    pub day_of_week: Option<String>,
    pub meal_kind: String,
    pub recipe_id: Option<i64>,
}

/// Full plan with its entries
#[derive(Debug, Serialize)]
pub struct PlanDetailResponse {
    pub id: i64,
    pub name: String,
    pub flags: DietaryFlags,
    pub target_calories: Option<f64>,
    pub details: Vec<MealPlanDetail>,
    pub restriction_ids: Vec<i64>,
}

/// Response for aggregate_meal_plan
#[derive(Debug, Serialize)]
pub struct AggregatePlanResponse {
    pub plan_id: i64,
    pub plan_name: String,
    pub grouping: Grouping,
    #[serde(flatten)]
    pub aggregate: PlanAggregate,
}

/// Response for evaluate_meal_plan
#[derive(Debug, Serialize)]
pub struct EvaluatePlanResponse {
    pub plan_id: i64,
    pub plan_name: String,
    pub restriction_count: usize,
    pub report: ComplianceReport,
    #[serde(flatten)]
    pub aggregate: PlanAggregate,
}

/// Create a meal plan
pub fn create_meal_plan(db: &Database, data: MealPlanCreate) -> Result<CreatePlanResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Plan name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = MealPlan::create(&conn, &data)
        .map_err(|e| format!("Failed to create meal plan: {}", e))?;

    Ok(CreatePlanResponse {
        id: plan.id,
        name: plan.name,
        created_at: plan.created_at,
    })
}

/// Add an entry to a plan
pub fn add_meal_plan_detail(
    db: &Database,
    data: MealPlanDetailCreate,
) -> Result<AddDetailResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = MealPlan::get_by_id(&conn, data.plan_id)
        .map_err(|e| format!("Database error checking plan: {}", e))?;
    if plan.is_none() {
        return Err(format!("Meal plan not found with id: {}", data.plan_id));
    }

    if let Some(recipe_id) = data.recipe_id {
        let recipe = Recipe::get_by_id(&conn, recipe_id)
            .map_err(|e| format!("Database error checking recipe: {}", e))?;
        if recipe.is_none() {
            return Err(format!("Recipe not found with id: {}", recipe_id));
        }
    }

    if data.recipe_id.is_none() && data.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
        return Err("A plan detail needs a recipe_id or a description".to_string());
    }

    let detail = MealPlanDetail::create(&conn, &data)
        .map_err(|e| format!("Failed to add plan detail: {}", e))?;

    Ok(AddDetailResponse {
        id: detail.id,
        plan_id: detail.plan_id,
        day_of_week: detail.day_of_week.map(|d| d.as_str().to_string()),
        meal_kind: detail.meal_kind.as_str().to_string(),
        recipe_id: detail.recipe_id,
    })
}

/// Attach a restriction to a plan
pub fn attach_plan_restriction(
    db: &Database,
    plan_id: i64,
    restriction_id: i64,
) -> Result<(), String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = MealPlan::get_by_id(&conn, plan_id)
        .map_err(|e| format!("Database error checking plan: {}", e))?;
    if plan.is_none() {
        return Err(format!("Meal plan not found with id: {}", plan_id));
    }

    MealPlan::attach_restriction(&conn, plan_id, restriction_id)
        .map_err(|e| format!("Failed to attach restriction: {}", e))
}

/// Get a plan with its entries and attached restrictions
pub fn get_meal_plan(db: &Database, id: i64) -> Result<Option<PlanDetailResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = match MealPlan::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get meal plan: {}", e))?
    {
        Some(plan) => plan,
        None => return Ok(None),
    };

    let details = MealPlanDetail::get_for_plan(&conn, id)
        .map_err(|e| format!("Failed to get plan details: {}", e))?;

    let restriction_ids = MealPlan::restriction_ids(&conn, id)
        .map_err(|e| format!("Failed to get plan restrictions: {}", e))?;

    Ok(Some(PlanDetailResponse {
        id: plan.id,
        name: plan.name,
        flags: plan.flags,
        target_calories: plan.target_calories,
        details,
        restriction_ids,
    }))
}

/// Aggregate a plan's nutrient totals
pub fn aggregate_meal_plan(
    db: &Database,
    plan_id: i64,
    grouping: Grouping,
) -> Result<AggregatePlanResponse, String> {
    let snapshot = build_plan_snapshot(db, plan_id)?;
    let aggregate = aggregate_plan(&snapshot, grouping);

    Ok(AggregatePlanResponse {
        plan_id: snapshot.plan_id,
        plan_name: snapshot.name,
        grouping,
        aggregate,
    })
}

/// Evaluate a plan against its attached restrictions
pub fn evaluate_meal_plan(db: &Database, plan_id: i64) -> Result<EvaluatePlanResponse, String> {
    let snapshot = build_plan_snapshot(db, plan_id)?;
    let aggregate = aggregate_plan(&snapshot, Grouping::Plan);

    let restriction_ids = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        MealPlan::restriction_ids(&conn, plan_id)
            .map_err(|e| format!("Failed to get plan restrictions: {}", e))?
    };

    let bound_rows = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        RestrictionBoundRow::get_for_restrictions(&conn, &restriction_ids)
            .map_err(|e| format!("Failed to load bounds: {}", e))?
    };

    let bounds = resolve_bounds(&bound_rows);
    let report = evaluate(&aggregate.totals, &bounds);

    Ok(EvaluatePlanResponse {
        plan_id: snapshot.plan_id,
        plan_name: snapshot.name,
        restriction_count: restriction_ids.len(),
        report,
        aggregate,
    })
}

/// Load an immutable aggregation snapshot of a plan
///
/// Details whose recipe reference was nulled out (deleted recipe) become
/// free-text entries; missing foods inside a recipe surface later as
/// aggregation warnings.
fn build_plan_snapshot(db: &Database, plan_id: i64) -> Result<PlanSnapshot, String> {
    let (plan, details) = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

        let plan = MealPlan::get_by_id(&conn, plan_id)
            .map_err(|e| format!("Failed to get meal plan: {}", e))?
            .ok_or_else(|| format!("Meal plan not found with id: {}", plan_id))?;

        let details = MealPlanDetail::get_for_plan(&conn, plan_id)
            .map_err(|e| format!("Failed to get plan details: {}", e))?;

        (plan, details)
    };

    let mut entries = Vec::with_capacity(details.len());
    for detail in details {
        let recipe = match detail.recipe_id {
            Some(recipe_id) => {
                let recipe = {
                    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
                    Recipe::get_by_id(&conn, recipe_id)
                        .map_err(|e| format!("Failed to get recipe: {}", e))?
                };
                match recipe {
                    Some(recipe) => Some(load_recipe_contents(db, &recipe)?),
                    None => None,
                }
            }
            None => None,
        };

        entries.push(PlanEntry {
            day: detail.day_of_week,
            meal: detail.meal_kind,
            recipe,
        });
    }

    Ok(PlanSnapshot {
        plan_id: plan.id,
        name: plan.name,
        entries,
    })
}
