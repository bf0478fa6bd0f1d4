//! Shared nutrient data structures
//!
//! The per-100g/100ml profile stored on food items, the scaled totals used
//! in aggregation and compliance checks, and the nutrient code enum that
//! restriction bounds refer to.

use serde::{Deserialize, Serialize};

/// Nutrient codes that restriction bounds can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientCode {
    Energy,
    Protein,
    Carbohydrates,
    Sugars,
    Fiber,
    TotalFat,
    SaturatedFat,
    Cholesterol,
    Sodium,
    Potassium,
    Calcium,
    Phosphorus,
    Magnesium,
    Iron,
    Zinc,
    Copper,
    Selenium,
    /// Codes from the catalog that the totals do not track
    Unknown,
}

impl NutrientCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientCode::Energy => "energy",
            NutrientCode::Protein => "protein",
            NutrientCode::Carbohydrates => "carbohydrates",
            NutrientCode::Sugars => "sugars",
            NutrientCode::Fiber => "fiber",
            NutrientCode::TotalFat => "total_fat",
            NutrientCode::SaturatedFat => "saturated_fat",
            NutrientCode::Cholesterol => "cholesterol",
            NutrientCode::Sodium => "sodium",
            NutrientCode::Potassium => "potassium",
            NutrientCode::Calcium => "calcium",
            NutrientCode::Phosphorus => "phosphorus",
            NutrientCode::Magnesium => "magnesium",
            NutrientCode::Iron => "iron",
            NutrientCode::Zinc => "zinc",
            NutrientCode::Copper => "copper",
            NutrientCode::Selenium => "selenium",
            NutrientCode::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "energy" => NutrientCode::Energy,
            "protein" => NutrientCode::Protein,
            "carbohydrates" => NutrientCode::Carbohydrates,
            "sugars" => NutrientCode::Sugars,
            "fiber" => NutrientCode::Fiber,
            "total_fat" => NutrientCode::TotalFat,
            "saturated_fat" => NutrientCode::SaturatedFat,
            "cholesterol" => NutrientCode::Cholesterol,
            "sodium" => NutrientCode::Sodium,
            "potassium" => NutrientCode::Potassium,
            "calcium" => NutrientCode::Calcium,
            "phosphorus" => NutrientCode::Phosphorus,
            "magnesium" => NutrientCode::Magnesium,
            "iron" => NutrientCode::Iron,
            "zinc" => NutrientCode::Zinc,
            "copper" => NutrientCode::Copper,
            "selenium" => NutrientCode::Selenium,
            _ => NutrientCode::Unknown,
        }
    }
}

/// Canonical per-100g/100ml nutrient record for a food item
///
/// Macronutrients are always present; vitamins, minerals, and alcohol may be
/// missing for incompletely catalogued items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub energy: f64,        // kcal
    pub protein: f64,       // grams
    pub carbohydrates: f64, // grams
    pub sugars: f64,        // grams
    pub fiber: f64,         // grams
    pub total_fat: f64,     // grams
    pub saturated_fat: f64,
    pub monounsaturated_fat: f64,
    pub polyunsaturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,   // milligrams

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

    pub sodium: Option<f64>,     // milligrams
    pub potassium: Option<f64>,  // milligrams
    pub calcium: Option<f64>,    // milligrams
    pub phosphorus: Option<f64>, // milligrams
    pub magnesium: Option<f64>,  // milligrams
    pub iron: Option<f64>,
    pub zinc: Option<f64>,
    pub copper: Option<f64>,
    pub selenium: Option<f64>,

    pub alcohol: Option<f64>,
}

impl NutrientProfile {
    /// Scale every field by a multiplier; absent optional fields contribute
    /// zero rather than propagating as missing.
    pub fn scaled(&self, multiplier: f64) -> NutrientTotals {
        let opt = |v: Option<f64>| v.unwrap_or(0.0) * multiplier;
        NutrientTotals {
            energy: self.energy * multiplier,
            protein: self.protein * multiplier,
            carbohydrates: self.carbohydrates * multiplier,
            sugars: self.sugars * multiplier,
            fiber: self.fiber * multiplier,
            total_fat: self.total_fat * multiplier,
            saturated_fat: self.saturated_fat * multiplier,
            monounsaturated_fat: self.monounsaturated_fat * multiplier,
            polyunsaturated_fat: self.polyunsaturated_fat * multiplier,
            trans_fat: self.trans_fat * multiplier,
            cholesterol: self.cholesterol * multiplier,
            vitamin_a: opt(self.vitamin_a),
            vitamin_c: opt(self.vitamin_c),
            vitamin_d: opt(self.vitamin_d),
            vitamin_e: opt(self.vitamin_e),
            vitamin_k: opt(self.vitamin_k),
            thiamin: opt(self.thiamin),
            riboflavin: opt(self.riboflavin),
            niacin: opt(self.niacin),
            vitamin_b6: opt(self.vitamin_b6),
            vitamin_b12: opt(self.vitamin_b12),
            folate: opt(self.folate),
            sodium: opt(self.sodium),
            potassium: opt(self.potassium),
            calcium: opt(self.calcium),
            phosphorus: opt(self.phosphorus),
            magnesium: opt(self.magnesium),
            iron: opt(self.iron),
            zinc: opt(self.zinc),
            copper: opt(self.copper),
            selenium: opt(self.selenium),
            alcohol: opt(self.alcohol),
        }
    }
}

/// Nutrient totals for a consumed portion, a recipe, or a whole meal plan
///
/// Unlike the profile, every field is concrete: missing source data has
/// already been folded in as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub energy: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub sugars: f64,
    pub fiber: f64,
    pub total_fat: f64,
    pub saturated_fat: f64,
    pub monounsaturated_fat: f64,
    pub polyunsaturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub vitamin_a: f64,
    pub vitamin_c: f64,
    pub vitamin_d: f64,
    pub vitamin_e: f64,
    pub vitamin_k: f64,
    pub thiamin: f64,
    pub riboflavin: f64,
    pub niacin: f64,
    pub vitamin_b6: f64,
    pub vitamin_b12: f64,
    pub folate: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub calcium: f64,
    pub phosphorus: f64,
    pub magnesium: f64,
    pub iron: f64,
    pub zinc: f64,
    pub copper: f64,
    pub selenium: f64,
    pub alcohol: f64,
}

impl NutrientTotals {
    /// Create totals with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Add another set of totals to this one
    pub fn add(&self, other: &NutrientTotals) -> Self {
        Self {
            energy: self.energy + other.energy,
            protein: self.protein + other.protein,
            carbohydrates: self.carbohydrates + other.carbohydrates,
            sugars: self.sugars + other.sugars,
            fiber: self.fiber + other.fiber,
            total_fat: self.total_fat + other.total_fat,
            saturated_fat: self.saturated_fat + other.saturated_fat,
            monounsaturated_fat: self.monounsaturated_fat + other.monounsaturated_fat,
            polyunsaturated_fat: self.polyunsaturated_fat + other.polyunsaturated_fat,
            trans_fat: self.trans_fat + other.trans_fat,
            cholesterol: self.cholesterol + other.cholesterol,
            vitamin_a: self.vitamin_a + other.vitamin_a,
            vitamin_c: self.vitamin_c + other.vitamin_c,
            vitamin_d: self.vitamin_d + other.vitamin_d,
            vitamin_e: self.vitamin_e + other.vitamin_e,
            vitamin_k: self.vitamin_k + other.vitamin_k,
            thiamin: self.thiamin + other.thiamin,
            riboflavin: self.riboflavin + other.riboflavin,
            niacin: self.niacin + other.niacin,
            vitamin_b6: self.vitamin_b6 + other.vitamin_b6,
            vitamin_b12: self.vitamin_b12 + other.vitamin_b12,
            folate: self.folate + other.folate,
            sodium: self.sodium + other.sodium,
            potassium: self.potassium + other.potassium,
            calcium: self.calcium + other.calcium,
            phosphorus: self.phosphorus + other.phosphorus,
            magnesium: self.magnesium + other.magnesium,
            iron: self.iron + other.iron,
            zinc: self.zinc + other.zinc,
            copper: self.copper + other.copper,
            selenium: self.selenium + other.selenium,
            alcohol: self.alcohol + other.alcohol,
        }
    }

    /// Round to presentation precision: two decimals for most fields, whole
    /// milligrams for the renal-critical minerals.
    pub fn rounded(&self) -> Self {
        let r2 = |v: f64| (v * 100.0).round() / 100.0;
        let r0 = |v: f64| v.round();
        Self {
            energy: r2(self.energy),
            protein: r2(self.protein),
            carbohydrates: r2(self.carbohydrates),
            sugars: r2(self.sugars),
            fiber: r2(self.fiber),
            total_fat: r2(self.total_fat),
            saturated_fat: r2(self.saturated_fat),
            monounsaturated_fat: r2(self.monounsaturated_fat),
            polyunsaturated_fat: r2(self.polyunsaturated_fat),
            trans_fat: r2(self.trans_fat),
            cholesterol: r2(self.cholesterol),
            vitamin_a: r2(self.vitamin_a),
            vitamin_c: r2(self.vitamin_c),
            vitamin_d: r2(self.vitamin_d),
            vitamin_e: r2(self.vitamin_e),
            vitamin_k: r2(self.vitamin_k),
            thiamin: r2(self.thiamin),
            riboflavin: r2(self.riboflavin),
            niacin: r2(self.niacin),
            vitamin_b6: r2(self.vitamin_b6),
            vitamin_b12: r2(self.vitamin_b12),
            folate: r2(self.folate),
            sodium: r0(self.sodium),
            potassium: r0(self.potassium),
            calcium: r2(self.calcium),
            phosphorus: r0(self.phosphorus),
            magnesium: r2(self.magnesium),
            iron: r2(self.iron),
            zinc: r2(self.zinc),
            copper: r2(self.copper),
            selenium: r2(self.selenium),
            alcohol: r2(self.alcohol),
        }
    }

    /// Look up the value tracked for a nutrient code
    ///
    /// Returns None for codes the totals do not carry, which restriction
    /// evaluation treats as unobservable rather than zero.
    pub fn value(&self, code: NutrientCode) -> Option<f64> {
        match code {
            NutrientCode::Energy => Some(self.energy),
            NutrientCode::Protein => Some(self.protein),
            NutrientCode::Carbohydrates => Some(self.carbohydrates),
            NutrientCode::Sugars => Some(self.sugars),
            NutrientCode::Fiber => Some(self.fiber),
            NutrientCode::TotalFat => Some(self.total_fat),
            NutrientCode::SaturatedFat => Some(self.saturated_fat),
            NutrientCode::Cholesterol => Some(self.cholesterol),
            NutrientCode::Sodium => Some(self.sodium),
            NutrientCode::Potassium => Some(self.potassium),
            NutrientCode::Calcium => Some(self.calcium),
            NutrientCode::Phosphorus => Some(self.phosphorus),
            NutrientCode::Magnesium => Some(self.magnesium),
            NutrientCode::Iron => Some(self.iron),
            NutrientCode::Zinc => Some(self.zinc),
            NutrientCode::Copper => Some(self.copper),
            NutrientCode::Selenium => Some(self.selenium),
            NutrientCode::Unknown => None,
        }
    }
}

impl std::ops::Add for NutrientTotals {
    type Output = NutrientTotals;

    fn add(self, other: NutrientTotals) -> NutrientTotals {
        NutrientTotals::add(&self, &other)
    }
}

impl std::iter::Sum for NutrientTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutrientTotals::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_treats_missing_as_zero() {
        let profile = NutrientProfile {
            energy: 52.0,
            protein: 0.3,
            sodium: Some(1.0),
            potassium: None,
            ..Default::default()
        };

        let totals = profile.scaled(2.0);
        assert_eq!(totals.energy, 104.0);
        assert_eq!(totals.sodium, 2.0);
        assert_eq!(totals.potassium, 0.0);
    }

    #[test]
    fn test_rounded_keeps_minerals_whole() {
        let totals = NutrientTotals {
            energy: 103.456,
            sodium: 140.4,
            potassium: 139.6,
            phosphorus: 99.5,
            ..Default::default()
        };

        let rounded = totals.rounded();
        assert_eq!(rounded.energy, 103.46);
        assert_eq!(rounded.sodium, 140.0);
        assert_eq!(rounded.potassium, 140.0);
        assert_eq!(rounded.phosphorus, 100.0);
    }

    #[test]
    fn test_sum() {
        let a = NutrientTotals { energy: 10.0, sodium: 5.0, ..Default::default() };
        let b = NutrientTotals { energy: 20.0, sodium: 7.0, ..Default::default() };

        let total: NutrientTotals = vec![a, b].into_iter().sum();
        assert_eq!(total.energy, 30.0);
        assert_eq!(total.sodium, 12.0);
    }

    #[test]
    fn test_nutrient_code_round_trip() {
        assert_eq!(NutrientCode::from_str("sodium"), NutrientCode::Sodium);
        assert_eq!(NutrientCode::from_str("SODIUM"), NutrientCode::Sodium);
        assert_eq!(NutrientCode::from_str("caffeine"), NutrientCode::Unknown);
        assert_eq!(NutrientCode::Phosphorus.as_str(), "phosphorus");
    }

    #[test]
    fn test_value_lookup() {
        let totals = NutrientTotals { sodium: 140.0, ..Default::default() };
        assert_eq!(totals.value(NutrientCode::Sodium), Some(140.0));
        assert_eq!(totals.value(NutrientCode::Unknown), None);
    }
}
