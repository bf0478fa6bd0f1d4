//! Meal-plan aggregation
//!
//! Sums nutrient contributions across a plan's recipe/ingredient graph,
//! operating on immutable snapshots assembled by the caller. Incomplete
//! ingredient data is skipped with a recorded warning; partial data never
//! aborts the aggregation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{DayOfWeek, DietaryFlags, MealKind, NutrientCode, NutrientProfile, NutrientTotals};

use super::restrictions::NutrientBound;
use super::units::portion_factor;

/// One ingredient of a recipe, resolved as far as the data allows
#[derive(Debug, Clone)]
pub struct IngredientPortion {
    /// Food name when known, for warning messages
    pub food_name: Option<String>,
    pub profile: Option<NutrientProfile>,
    pub quantity: Option<f64>,
    /// Resolved per-100 unit factor; None means the quantity is in g/ml
    pub unit_factor: Option<f64>,
}

/// A recipe with its resolved ingredients
#[derive(Debug, Clone)]
pub struct RecipeContents {
    pub recipe_id: i64,
    pub name: String,
    pub ingredients: Vec<IngredientPortion>,
}

/// A single plan entry snapshot
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub day: Option<DayOfWeek>,
    pub meal: MealKind,
    /// None for free-text entries, which contribute no nutrients
    pub recipe: Option<RecipeContents>,
}

/// An immutable snapshot of a plan, assembled by the caller
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    pub plan_id: i64,
    pub name: String,
    pub entries: Vec<PlanEntry>,
}

/// Grouping key for aggregation output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    Plan,
    DayOfWeek,
}

/// Why an ingredient was skipped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingFood,
    MissingQuantity,
    InvalidQuantity(f64),
}

/// A recorded skip during aggregation
#[derive(Debug, Clone, Serialize)]
pub struct AggregationWarning {
    pub recipe: String,
    pub ingredient: Option<String>,
    pub reason: SkipReason,
}

/// Totals for one group (the whole plan, or one day)
#[derive(Debug, Clone, Serialize)]
pub struct GroupTotals {
    pub key: String,
    pub totals: NutrientTotals,
}

/// Aggregation result
#[derive(Debug, Clone, Serialize)]
pub struct PlanAggregate {
    pub totals: NutrientTotals,
    pub groups: Vec<GroupTotals>,
    pub warnings: Vec<AggregationWarning>,
    pub ingredients_counted: usize,
    pub ingredients_skipped: usize,
}

/// A declared dietary flag contradicted by the computed totals
#[derive(Debug, Clone, Serialize)]
pub struct FlagMismatch {
    pub flag: &'static str,
    pub nutrient: NutrientCode,
    pub observed: f64,
    pub limit: f64,
}

/// Sum one recipe's ingredient contributions
///
/// Returns the unrounded totals plus a warning per skipped ingredient.
pub fn aggregate_recipe(contents: &RecipeContents) -> (NutrientTotals, Vec<AggregationWarning>) {
    let mut totals = NutrientTotals::zero();
    let mut warnings = Vec::new();

    for ingredient in &contents.ingredients {
        let profile = match &ingredient.profile {
            Some(profile) => profile,
            None => {
                warnings.push(AggregationWarning {
                    recipe: contents.name.clone(),
                    ingredient: ingredient.food_name.clone(),
                    reason: SkipReason::MissingFood,
                });
                continue;
            }
        };

        let quantity = match ingredient.quantity {
            Some(q) => q,
            None => {
                warnings.push(AggregationWarning {
                    recipe: contents.name.clone(),
                    ingredient: ingredient.food_name.clone(),
                    reason: SkipReason::MissingQuantity,
                });
                continue;
            }
        };

        if !quantity.is_finite() || quantity < 0.0 {
            warnings.push(AggregationWarning {
                recipe: contents.name.clone(),
                ingredient: ingredient.food_name.clone(),
                reason: SkipReason::InvalidQuantity(quantity),
            });
            continue;
        }

        let factor = portion_factor(quantity, ingredient.unit_factor);
        totals = totals + profile.scaled(factor);
    }

    (totals, warnings)
}

/// Aggregate a whole plan
///
/// Walks every entry, resolves each to a recipe when present, and sums
/// ingredient contributions componentwise. Free-text entries contribute
/// nothing. Output feeds `restrictions::evaluate` directly.
pub fn aggregate_plan(snapshot: &PlanSnapshot, grouping: Grouping) -> PlanAggregate {
    let mut totals = NutrientTotals::zero();
    let mut warnings = Vec::new();
    let mut counted = 0;
    let mut skipped = 0;

    // BTreeMap keeps group output in a stable order
    let mut groups: BTreeMap<String, NutrientTotals> = BTreeMap::new();

    for entry in &snapshot.entries {
        let contents = match &entry.recipe {
            Some(contents) => contents,
            None => continue,
        };

        let (recipe_totals, recipe_warnings) = aggregate_recipe(contents);
        counted += contents.ingredients.len() - recipe_warnings.len();
        skipped += recipe_warnings.len();

        if let Some(skipped_names) = summarize_skips(&recipe_warnings) {
            tracing::warn!(
                recipe = %contents.name,
                skipped = %skipped_names,
                "skipped ingredients with incomplete data during aggregation"
            );
        }
        warnings.extend(recipe_warnings);

        if grouping == Grouping::DayOfWeek {
            let key = entry
                .day
                .map(|d| d.as_str().to_string())
                .unwrap_or_else(|| "unscheduled".to_string());
            let group = groups.entry(key).or_insert_with(NutrientTotals::zero);
            *group = group.add(&recipe_totals);
        }

        totals = totals + recipe_totals;
    }

    let groups = groups
        .into_iter()
        .map(|(key, totals)| GroupTotals {
            key,
            totals: totals.rounded(),
        })
        .collect();

    PlanAggregate {
        totals: totals.rounded(),
        groups,
        warnings,
        ingredients_counted: counted,
        ingredients_skipped: skipped,
    }
}

/// Compare declared dietary flags against computed totals
///
/// The flags stay editorial metadata; a declared "low X" whose computed
/// total exceeds the reference maximum for X is reported as a data-quality
/// mismatch, nothing more.
pub fn reconcile_flags(
    flags: &DietaryFlags,
    totals: &NutrientTotals,
    reference_bounds: &[NutrientBound],
) -> Vec<FlagMismatch> {
    let claimed = [
        (flags.low_sodium, "low_sodium", NutrientCode::Sodium),
        (flags.low_potassium, "low_potassium", NutrientCode::Potassium),
        (flags.low_phosphorus, "low_phosphorus", NutrientCode::Phosphorus),
        (flags.low_protein, "low_protein", NutrientCode::Protein),
    ];

    let mut mismatches = Vec::new();

    for (is_claimed, flag, code) in claimed {
        if !is_claimed {
            continue;
        }

        let limit = reference_bounds
            .iter()
            .find(|b| b.code == code)
            .and_then(|b| b.max);

        if let (Some(limit), Some(observed)) = (limit, totals.value(code)) {
            if observed > limit {
                mismatches.push(FlagMismatch {
                    flag,
                    nutrient: code,
                    observed,
                    limit,
                });
            }
        }
    }

    mismatches
}

fn summarize_skips(warnings: &[AggregationWarning]) -> Option<String> {
    if warnings.is_empty() {
        return None;
    }
    Some(
        warnings
            .iter()
            .map(|w| w.ingredient.as_deref().unwrap_or("<unknown>"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chicken() -> NutrientProfile {
        NutrientProfile {
            energy: 165.0,
            protein: 31.0,
            sodium: Some(74.0),
            potassium: Some(256.0),
            phosphorus: Some(228.0),
            ..Default::default()
        }
    }

    fn rice() -> NutrientProfile {
        NutrientProfile {
            energy: 130.0,
            protein: 2.7,
            carbohydrates: 28.0,
            sodium: Some(1.0),
            potassium: Some(35.0),
            phosphorus: Some(43.0),
            ..Default::default()
        }
    }

    fn portion(profile: NutrientProfile, name: &str, quantity: f64) -> IngredientPortion {
        IngredientPortion {
            food_name: Some(name.to_string()),
            profile: Some(profile),
            quantity: Some(quantity),
            unit_factor: None,
        }
    }

    #[test]
    fn test_recipe_sums_ingredients() {
        let contents = RecipeContents {
            recipe_id: 1,
            name: "Chicken and rice".to_string(),
            ingredients: vec![
                portion(chicken(), "Chicken breast", 150.0),
                portion(rice(), "Cooked rice", 100.0),
            ],
        };

        let (totals, warnings) = aggregate_recipe(&contents);
        assert!(warnings.is_empty());
        // 1.5x chicken + 1x rice
        assert!((totals.energy - (165.0 * 1.5 + 130.0)).abs() < 1e-9);
        assert!((totals.protein - (31.0 * 1.5 + 2.7)).abs() < 1e-9);
        assert!((totals.sodium - (74.0 * 1.5 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_food_skipped_with_warning_not_zeroed() {
        let contents = RecipeContents {
            recipe_id: 1,
            name: "Partial".to_string(),
            ingredients: vec![
                portion(rice(), "Cooked rice", 100.0),
                IngredientPortion {
                    food_name: Some("Mystery food".to_string()),
                    profile: None,
                    quantity: Some(50.0),
                    unit_factor: None,
                },
            ],
        };

        let (totals, warnings) = aggregate_recipe(&contents);
        // The resolvable ingredient still counts
        assert_eq!(totals.energy, 130.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].reason, SkipReason::MissingFood);
        assert_eq!(warnings[0].ingredient.as_deref(), Some("Mystery food"));
    }

    #[test]
    fn test_missing_quantity_skipped() {
        let contents = RecipeContents {
            recipe_id: 1,
            name: "Partial".to_string(),
            ingredients: vec![IngredientPortion {
                food_name: Some("Rice".to_string()),
                profile: Some(rice()),
                quantity: None,
                unit_factor: None,
            }],
        };

        let (totals, warnings) = aggregate_recipe(&contents);
        assert_eq!(totals, NutrientTotals::zero());
        assert_eq!(warnings[0].reason, SkipReason::MissingQuantity);
    }

    #[test]
    fn test_negative_quantity_skipped() {
        let contents = RecipeContents {
            recipe_id: 1,
            name: "Bad data".to_string(),
            ingredients: vec![portion(rice(), "Rice", -10.0)],
        };

        let (_, warnings) = aggregate_recipe(&contents);
        assert_eq!(warnings[0].reason, SkipReason::InvalidQuantity(-10.0));
    }

    fn snapshot() -> PlanSnapshot {
        let lunch = RecipeContents {
            recipe_id: 1,
            name: "Chicken plate".to_string(),
            ingredients: vec![portion(chicken(), "Chicken breast", 100.0)],
        };
        let dinner = RecipeContents {
            recipe_id: 2,
            name: "Rice bowl".to_string(),
            ingredients: vec![portion(rice(), "Cooked rice", 200.0)],
        };

        PlanSnapshot {
            plan_id: 1,
            name: "Week A".to_string(),
            entries: vec![
                PlanEntry {
                    day: Some(DayOfWeek::Monday),
                    meal: MealKind::Lunch,
                    recipe: Some(lunch),
                },
                PlanEntry {
                    day: Some(DayOfWeek::Tuesday),
                    meal: MealKind::Dinner,
                    recipe: Some(dinner),
                },
                // Free-text entry: no nutrient contribution
                PlanEntry {
                    day: Some(DayOfWeek::Tuesday),
                    meal: MealKind::Snack,
                    recipe: None,
                },
            ],
        }
    }

    #[test]
    fn test_plan_totals() {
        let aggregate = aggregate_plan(&snapshot(), Grouping::Plan);

        assert!(aggregate.warnings.is_empty());
        assert_eq!(aggregate.ingredients_counted, 2);
        assert_eq!(aggregate.totals.energy, 165.0 + 260.0);
        assert!(aggregate.groups.is_empty());
    }

    #[test]
    fn test_plan_grouped_by_day() {
        let aggregate = aggregate_plan(&snapshot(), Grouping::DayOfWeek);

        assert_eq!(aggregate.groups.len(), 2);
        let monday = aggregate.groups.iter().find(|g| g.key == "monday").unwrap();
        assert_eq!(monday.totals.energy, 165.0);
        let tuesday = aggregate.groups.iter().find(|g| g.key == "tuesday").unwrap();
        assert_eq!(tuesday.totals.energy, 260.0);
    }

    #[test]
    fn test_flag_reconciliation() {
        let flags = DietaryFlags {
            low_sodium: true,
            low_potassium: true,
            ..Default::default()
        };
        let totals = NutrientTotals {
            sodium: 900.0,
            potassium: 300.0,
            ..Default::default()
        };
        let bounds = [
            NutrientBound::new(NutrientCode::Sodium, None, Some(600.0)),
            NutrientBound::new(NutrientCode::Potassium, None, Some(700.0)),
        ];

        let mismatches = reconcile_flags(&flags, &totals, &bounds);
        // Sodium claim contradicted, potassium claim holds
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].flag, "low_sodium");
        assert_eq!(mismatches[0].observed, 900.0);
        assert_eq!(mismatches[0].limit, 600.0);
    }

    #[test]
    fn test_unclaimed_flags_never_mismatch() {
        let flags = DietaryFlags::default();
        let totals = NutrientTotals {
            sodium: 99999.0,
            ..Default::default()
        };
        let bounds = [NutrientBound::new(NutrientCode::Sodium, None, Some(600.0))];

        assert!(reconcile_flags(&flags, &totals, &bounds).is_empty());
    }
}
