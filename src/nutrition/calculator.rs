//! Medical profile calculator
//!
//! BMI and daily caloric needs from anthropometric data. Implausible
//! measurements degrade to an explicit `Uncomputable` result that callers
//! map to null; they never raise.

use serde::Serialize;
use thiserror::Error;

use crate::models::{ActivityLevel, Sex};

/// Why a derived value could not be computed
///
/// Carried as data so callers must consciously handle the degraded case
/// instead of relying on silent null propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Uncomputable {
    #[error("height must be greater than zero")]
    NonPositiveHeight,
    #[error("weight must be greater than zero")]
    NonPositiveWeight,
    #[error("measurement is not a finite number")]
    NotFinite,
}

/// Inputs to the daily calorie computation
#[derive(Debug, Clone)]
pub struct EnergyInput {
    pub weight_kg: f64,
    pub height_m: f64,
    /// Defaults to 30 when the birth date is unavailable
    pub age_years: Option<u32>,
    pub sex: Sex,
    pub activity: ActivityLevel,
    /// Flat 10% reduction reflecting reduced renal metabolic demand
    pub renal_adjustment: bool,
}

/// Standard meal-plan calorie tiers
pub const CALORIE_TIERS: [u32; 4] = [1400, 1600, 1800, 2000];

/// Default age when none is known
const DEFAULT_AGE_YEARS: u32 = 30;

/// Body mass index: weight / height², rounded to two decimals
pub fn compute_bmi(weight_kg: f64, height_m: f64) -> Result<f64, Uncomputable> {
    let result = validate_measurements(weight_kg, height_m);
    if let Err(reason) = result {
        tracing::warn!(weight_kg, height_m, %reason, "BMI uncomputable");
        return Err(reason);
    }

    let bmi = weight_kg / (height_m * height_m);
    Ok((bmi * 100.0).round() / 100.0)
}

/// Daily caloric needs via the revised Harris-Benedict equation
///
/// The profile stores height in meters; the formula itself works in
/// centimeters. The female coefficients are also used when the sex is
/// unspecified.
pub fn compute_daily_calories(input: &EnergyInput) -> Result<u32, Uncomputable> {
    if let Err(reason) = validate_measurements(input.weight_kg, input.height_m) {
        tracing::warn!(
            weight_kg = input.weight_kg,
            height_m = input.height_m,
            %reason,
            "daily calories uncomputable"
        );
        return Err(reason);
    }

    let weight = input.weight_kg;
    let height_cm = input.height_m * 100.0;
    let age = f64::from(input.age_years.unwrap_or(DEFAULT_AGE_YEARS));

    let bmr = match input.sex {
        Sex::Male => 88.362 + 13.397 * weight + 4.799 * height_cm - 5.677 * age,
        Sex::Female | Sex::Unspecified => {
            447.593 + 9.247 * weight + 3.098 * height_cm - 4.330 * age
        }
    };

    let mut calories = bmr * input.activity.factor();
    if input.renal_adjustment {
        calories *= 0.9;
    }

    Ok(calories.round().max(0.0) as u32)
}

/// Snap a calorie value to the nearest standard meal-plan tier
///
/// Minimizes absolute difference; ties break toward the lower tier.
pub fn nearest_calorie_tier(calories: u32) -> u32 {
    let mut best = CALORIE_TIERS[0];
    let mut best_diff = u32::MAX;

    for &tier in &CALORIE_TIERS {
        let diff = calories.abs_diff(tier);
        if diff < best_diff {
            best = tier;
            best_diff = diff;
        }
    }

    best
}

fn validate_measurements(weight_kg: f64, height_m: f64) -> Result<(), Uncomputable> {
    if !weight_kg.is_finite() || !height_m.is_finite() {
        return Err(Uncomputable::NotFinite);
    }
    if height_m <= 0.0 {
        return Err(Uncomputable::NonPositiveHeight);
    }
    if weight_kg <= 0.0 {
        return Err(Uncomputable::NonPositiveWeight);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(weight_kg: f64, height_m: f64, age: u32, sex: Sex, activity: ActivityLevel) -> EnergyInput {
        EnergyInput {
            weight_kg,
            height_m,
            age_years: Some(age),
            sex,
            activity,
            renal_adjustment: true,
        }
    }

    #[test]
    fn test_bmi_basic() {
        assert_eq!(compute_bmi(70.0, 1.75).unwrap(), 22.86);
        assert_eq!(compute_bmi(65.0, 1.60).unwrap(), 25.39);
    }

    #[test]
    fn test_bmi_uncomputable_not_a_panic() {
        assert_eq!(compute_bmi(70.0, 0.0), Err(Uncomputable::NonPositiveHeight));
        assert_eq!(compute_bmi(70.0, -1.0), Err(Uncomputable::NonPositiveHeight));
        assert_eq!(compute_bmi(-5.0, 1.7), Err(Uncomputable::NonPositiveWeight));
        assert_eq!(compute_bmi(f64::NAN, 1.7), Err(Uncomputable::NotFinite));
    }

    #[test]
    fn test_daily_calories_male_sedentary() {
        // Revised Harris-Benedict, height in cm inside the formula
        let expected = ((88.362_f64 + 13.397 * 70.0 + 4.799 * 175.0 - 5.677 * 30.0) * 1.2 * 0.9)
            .round() as u32;

        let calories =
            compute_daily_calories(&input(70.0, 1.75, 30, Sex::Male, ActivityLevel::Sedentary))
                .unwrap();
        assert_eq!(calories, expected);
    }

    #[test]
    fn test_daily_calories_female_moderate() {
        let expected = ((447.593_f64 + 9.247 * 65.0 + 3.098 * 160.0 - 4.330 * 45.0) * 1.55 * 0.9)
            .round() as u32;

        let calories =
            compute_daily_calories(&input(65.0, 1.60, 45, Sex::Female, ActivityLevel::Moderate))
                .unwrap();
        assert_eq!(calories, expected);
    }

    #[test]
    fn test_unspecified_sex_uses_female_formula() {
        let female =
            compute_daily_calories(&input(65.0, 1.60, 45, Sex::Female, ActivityLevel::Moderate))
                .unwrap();
        let unspecified = compute_daily_calories(&input(
            65.0,
            1.60,
            45,
            Sex::Unspecified,
            ActivityLevel::Moderate,
        ))
        .unwrap();
        assert_eq!(female, unspecified);
    }

    #[test]
    fn test_missing_age_defaults_to_30() {
        let mut explicit = input(70.0, 1.75, 30, Sex::Male, ActivityLevel::Sedentary);
        let with_age = compute_daily_calories(&explicit).unwrap();

        explicit.age_years = None;
        let defaulted = compute_daily_calories(&explicit).unwrap();
        assert_eq!(with_age, defaulted);
    }

    #[test]
    fn test_renal_adjustment_is_ten_percent() {
        let mut i = input(70.0, 1.75, 30, Sex::Male, ActivityLevel::Sedentary);
        let adjusted = compute_daily_calories(&i).unwrap();

        i.renal_adjustment = false;
        let unadjusted = compute_daily_calories(&i).unwrap();

        let expected = (f64::from(unadjusted)) * 0.9;
        // Both values round independently, so allow one kcal of slack
        assert!((f64::from(adjusted) - expected).abs() <= 1.0);
        assert!(adjusted < unadjusted);
    }

    #[test]
    fn test_monotonic_in_weight() {
        let mut previous = 0;
        for weight in [50.0, 60.0, 70.0, 80.0, 90.0, 100.0] {
            let calories =
                compute_daily_calories(&input(weight, 1.75, 40, Sex::Male, ActivityLevel::Light))
                    .unwrap();
            assert!(calories > previous, "calories must increase with weight");
            previous = calories;
        }
    }

    #[test]
    fn test_calories_uncomputable_on_bad_measurements() {
        let bad = input(0.0, 1.75, 30, Sex::Male, ActivityLevel::Sedentary);
        assert_eq!(
            compute_daily_calories(&bad),
            Err(Uncomputable::NonPositiveWeight)
        );
    }

    #[test]
    fn test_nearest_calorie_tier() {
        assert_eq!(nearest_calorie_tier(1350), 1400);
        assert_eq!(nearest_calorie_tier(1710), 1800);
        assert_eq!(nearest_calorie_tier(2500), 2000);
        assert_eq!(nearest_calorie_tier(900), 1400);

        // Exact tie breaks toward the lower tier
        assert_eq!(nearest_calorie_tier(1500), 1400);
        assert_eq!(nearest_calorie_tier(1700), 1600);
        assert_eq!(nearest_calorie_tier(1900), 1800);
    }

    #[test]
    fn test_tier_is_always_a_member() {
        for kcal in (0..4000).step_by(37) {
            assert!(CALORIE_TIERS.contains(&nearest_calorie_tier(kcal)));
        }
    }
}
