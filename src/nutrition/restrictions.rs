//! Dietary restriction engine
//!
//! Stateless evaluation of nutrient totals against a set of bounds. Bounds
//! are inclusive on both ends; nutrients without bounds are vacuously
//! compliant.

use serde::Serialize;

use crate::models::{NutrientCode, NutrientTotals, RestrictionBoundRow};

/// A resolved bound: one nutrient, optional min and/or max
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientBound {
    pub code: NutrientCode,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NutrientBound {
    pub fn new(code: NutrientCode, min: Option<f64>, max: Option<f64>) -> Self {
        Self { code, min, max }
    }
}

/// Result of checking one bound against the totals
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceCheck {
    pub code: NutrientCode,
    /// None when the totals do not track this nutrient
    pub observed: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub within_bounds: bool,
}

/// Full evaluation result: per-nutrient detail plus the overall verdict
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub checks: Vec<ComplianceCheck>,
    /// Logical AND of every per-nutrient check
    pub compliant: bool,
}

/// Union of bounds across a set of restrictions
///
/// Stage one of the evaluation pipeline: every bound from every attached
/// restriction applies. A nutrient bounded by two restrictions is simply
/// checked twice.
pub fn resolve_bounds(bound_rows: &[RestrictionBoundRow]) -> Vec<NutrientBound> {
    bound_rows
        .iter()
        .map(|row| NutrientBound::new(row.nutrient_code, row.min_value, row.max_value))
        .collect()
}

/// Evaluate totals against bounds
///
/// Inclusive comparison: a value exactly at the bound is compliant. A bound
/// with only a minimum checks value >= min; only a maximum checks
/// value <= max. Bounds on nutrients the totals cannot observe are recorded
/// with a null observation and do not fail the report.
pub fn evaluate(totals: &NutrientTotals, bounds: &[NutrientBound]) -> ComplianceReport {
    let mut checks = Vec::with_capacity(bounds.len());

    for bound in bounds {
        let observed = totals.value(bound.code);

        let within_bounds = match observed {
            Some(value) => {
                let above_min = bound.min.map_or(true, |min| value >= min);
                let below_max = bound.max.map_or(true, |max| value <= max);
                above_min && below_max
            }
            None => true,
        };

        checks.push(ComplianceCheck {
            code: bound.code,
            observed,
            min: bound.min,
            max: bound.max,
            within_bounds,
        });
    }

    let compliant = checks.iter().all(|c| c.within_bounds);

    ComplianceReport { checks, compliant }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(sodium: f64, potassium: f64, protein: f64) -> NutrientTotals {
        NutrientTotals {
            sodium,
            potassium,
            protein,
            ..Default::default()
        }
    }

    #[test]
    fn test_inclusive_upper_bound() {
        let bounds = [NutrientBound::new(NutrientCode::Sodium, Some(0.0), Some(140.0))];

        // Exactly at the bound is compliant
        let report = evaluate(&totals(140.0, 0.0, 0.0), &bounds);
        assert!(report.compliant);
        assert!(report.checks[0].within_bounds);

        // Just over is not
        let report = evaluate(&totals(140.01, 0.0, 0.0), &bounds);
        assert!(!report.compliant);
        assert!(!report.checks[0].within_bounds);
    }

    #[test]
    fn test_min_only_bound() {
        let bounds = [NutrientBound::new(NutrientCode::Protein, Some(40.0), None)];

        assert!(evaluate(&totals(0.0, 0.0, 40.0), &bounds).compliant);
        assert!(evaluate(&totals(0.0, 0.0, 55.0), &bounds).compliant);
        assert!(!evaluate(&totals(0.0, 0.0, 39.9), &bounds).compliant);
    }

    #[test]
    fn test_max_only_bound() {
        let bounds = [NutrientBound::new(NutrientCode::Potassium, None, Some(2000.0))];

        assert!(evaluate(&totals(0.0, 1999.0, 0.0), &bounds).compliant);
        assert!(!evaluate(&totals(0.0, 2000.5, 0.0), &bounds).compliant);
    }

    #[test]
    fn test_no_bounds_is_vacuously_compliant() {
        let report = evaluate(&totals(9999.0, 9999.0, 9999.0), &[]);
        assert!(report.compliant);
        assert!(report.checks.is_empty());
    }

    #[test]
    fn test_overall_is_and_of_checks() {
        let bounds = [
            NutrientBound::new(NutrientCode::Sodium, None, Some(2000.0)),
            NutrientBound::new(NutrientCode::Potassium, None, Some(2000.0)),
        ];

        // One nutrient out of bounds fails the whole report
        let report = evaluate(&totals(500.0, 2500.0, 0.0), &bounds);
        assert!(!report.compliant);
        assert!(report.checks[0].within_bounds);
        assert!(!report.checks[1].within_bounds);
    }

    #[test]
    fn test_unobservable_nutrient_does_not_fail() {
        let bounds = [NutrientBound::new(NutrientCode::Unknown, Some(1.0), Some(2.0))];

        let report = evaluate(&totals(0.0, 0.0, 0.0), &bounds);
        assert!(report.compliant);
        assert_eq!(report.checks[0].observed, None);
    }

    #[test]
    fn test_resolve_bounds_unions_restrictions() {
        let rows = vec![
            RestrictionBoundRow {
                id: 1,
                restriction_id: 10,
                nutrient_code: NutrientCode::Sodium,
                min_value: None,
                max_value: Some(2000.0),
            },
            RestrictionBoundRow {
                id: 2,
                restriction_id: 11,
                nutrient_code: NutrientCode::Phosphorus,
                min_value: None,
                max_value: Some(1000.0),
            },
        ];

        let bounds = resolve_bounds(&rows);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].code, NutrientCode::Sodium);
        assert_eq!(bounds[1].code, NutrientCode::Phosphorus);
    }
}
