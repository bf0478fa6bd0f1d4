//! Unit conversion
//!
//! Nutrient profiles are stored per 100 g or 100 ml. A measurement unit
//! carries an equivalence on one axis (ml for volume measures, g for mass
//! measures); the scaling factor turns a quantity in that unit into a
//! per-100 multiplier.

/// Fallback factor for units with no catalogued equivalence
///
/// Treats the raw quantity as already expressed in hundredths of the
/// reference unit, keeping totals computable for incomplete catalog data.
pub const DEFAULT_UNIT_FACTOR: f64 = 0.01;

/// Per-100 scaling factor for a unit
///
/// Returns `equivalence / 100` along the requested axis when the unit
/// carries it; otherwise the default fallback. Missing equivalences never
/// error.
pub fn scaling_factor(
    ml_equivalence: Option<f64>,
    g_equivalence: Option<f64>,
    for_volume: bool,
) -> f64 {
    if for_volume {
        if let Some(ml) = ml_equivalence {
            return ml / 100.0;
        }
    } else if let Some(g) = g_equivalence {
        return g / 100.0;
    }

    DEFAULT_UNIT_FACTOR
}

/// Per-100 multiplier for a quantity, with or without a catalogued unit
///
/// Without a unit the quantity is taken to be grams/milliliters directly,
/// which is the same as a unit with equivalence 1.0.
pub fn portion_factor(quantity: f64, unit_factor: Option<f64>) -> f64 {
    quantity * unit_factor.unwrap_or(DEFAULT_UNIT_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_unit_factor() {
        // A 200ml cup scales per-100ml values by 2 per cup
        assert_eq!(scaling_factor(Some(200.0), None, true), 2.0);
    }

    #[test]
    fn test_mass_unit_factor() {
        // A 30g matchbox-size portion
        assert_eq!(scaling_factor(None, Some(30.0), false), 0.3);
    }

    #[test]
    fn test_missing_equivalence_falls_back() {
        assert_eq!(scaling_factor(None, None, true), DEFAULT_UNIT_FACTOR);
        assert_eq!(scaling_factor(None, None, false), DEFAULT_UNIT_FACTOR);
        // Equivalence on the wrong axis does not apply
        assert_eq!(scaling_factor(Some(250.0), None, false), DEFAULT_UNIT_FACTOR);
        assert_eq!(scaling_factor(None, Some(50.0), true), DEFAULT_UNIT_FACTOR);
    }

    #[test]
    fn test_portion_factor_without_unit_is_per_100() {
        // 150g with no unit = 1.5x the per-100 values
        assert!((portion_factor(150.0, None) - 1.5).abs() < 1e-9);
        // 2 cups of 200ml = 4x
        assert!((portion_factor(2.0, Some(2.0)) - 4.0).abs() < 1e-9);
    }
}
