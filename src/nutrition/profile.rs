//! Portion scaling
//!
//! Derives nutrient totals for an arbitrary consumed quantity from a food
//! item's per-100 profile and an optional measurement unit.

use crate::models::{MeasurementUnit, NutrientProfile, NutrientTotals};

use super::units::portion_factor;
use super::NutritionError;

/// Nutrient totals for a consumed quantity of a food
///
/// The quantity is interpreted through the unit's equivalence when one is
/// given, otherwise as grams/milliliters directly. Missing optional
/// micronutrients contribute zero. Results are rounded to presentation
/// precision (two decimals; whole milligrams for sodium, potassium, and
/// phosphorus).
///
/// Rejects negative and non-finite quantities; zero is a valid (empty)
/// portion.
pub fn nutrients_for_quantity(
    profile: &NutrientProfile,
    quantity: f64,
    unit: Option<&MeasurementUnit>,
) -> Result<NutrientTotals, NutritionError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(NutritionError::InvalidQuantity(quantity));
    }

    let factor = portion_factor(quantity, unit.map(|u| u.factor()));
    Ok(profile.scaled(factor).rounded())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apple() -> NutrientProfile {
        NutrientProfile {
            energy: 52.0,
            protein: 0.26,
            carbohydrates: 13.81,
            sugars: 10.39,
            fiber: 2.4,
            total_fat: 0.17,
            sodium: Some(1.0),
            potassium: Some(107.0),
            phosphorus: Some(11.0),
            ..Default::default()
        }
    }

    fn cup() -> MeasurementUnit {
        MeasurementUnit {
            id: 1,
            name: "Cup".to_string(),
            ml_equivalence: Some(200.0),
            g_equivalence: None,
            is_volume: true,
            created_at: String::new(),
        }
    }

    fn gram_unit() -> MeasurementUnit {
        MeasurementUnit {
            id: 2,
            name: "Gram".to_string(),
            ml_equivalence: None,
            g_equivalence: Some(1.0),
            is_volume: false,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_identity_at_canonical_quantity() {
        // 100g through a gram unit returns the stored per-100g profile
        let totals = nutrients_for_quantity(&apple(), 100.0, Some(&gram_unit())).unwrap();
        assert_eq!(totals.energy, 52.0);
        assert_eq!(totals.protein, 0.26);
        assert_eq!(totals.sodium, 1.0);
        assert_eq!(totals.potassium, 107.0);
    }

    #[test]
    fn test_identity_without_unit() {
        let totals = nutrients_for_quantity(&apple(), 100.0, None).unwrap();
        assert_eq!(totals.energy, 52.0);
        assert_eq!(totals.carbohydrates, 13.81);
    }

    #[test]
    fn test_double_quantity_doubles_every_field() {
        let base = nutrients_for_quantity(&apple(), 100.0, None).unwrap();
        let doubled = nutrients_for_quantity(&apple(), 200.0, None).unwrap();

        assert_eq!(doubled.energy, base.energy * 2.0);
        assert_eq!(doubled.protein, base.protein * 2.0);
        assert_eq!(doubled.carbohydrates, base.carbohydrates * 2.0);
        assert_eq!(doubled.sugars, base.sugars * 2.0);
        assert_eq!(doubled.fiber, base.fiber * 2.0);
        assert_eq!(doubled.sodium, base.sodium * 2.0);
        assert_eq!(doubled.potassium, base.potassium * 2.0);
        assert_eq!(doubled.phosphorus, base.phosphorus * 2.0);
    }

    #[test]
    fn test_volume_unit_scaling() {
        // 2 cups of 200ml each = 4x the per-100ml profile
        let totals = nutrients_for_quantity(&apple(), 2.0, Some(&cup())).unwrap();
        assert_eq!(totals.energy, 208.0);
        assert_eq!(totals.potassium, 428.0);
    }

    #[test]
    fn test_zero_quantity_is_valid() {
        let totals = nutrients_for_quantity(&apple(), 0.0, None).unwrap();
        assert_eq!(totals, NutrientTotals::zero());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = nutrients_for_quantity(&apple(), -50.0, None).unwrap_err();
        assert_eq!(err, NutritionError::InvalidQuantity(-50.0));
    }

    #[test]
    fn test_non_finite_quantity_rejected() {
        assert!(nutrients_for_quantity(&apple(), f64::NAN, None).is_err());
        assert!(nutrients_for_quantity(&apple(), f64::INFINITY, None).is_err());
    }

    #[test]
    fn test_missing_micronutrients_contribute_zero() {
        let profile = NutrientProfile {
            energy: 100.0,
            sodium: None,
            ..Default::default()
        };

        let totals = nutrients_for_quantity(&profile, 200.0, None).unwrap();
        assert_eq!(totals.sodium, 0.0);
        assert_eq!(totals.energy, 200.0);
    }
}
