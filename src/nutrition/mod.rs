//! Nutrition computation core
//!
//! Pure functions over in-memory snapshots: unit conversion, portion
//! scaling, the medical profile calculator, restriction evaluation,
//! meal-plan aggregation, and food-name similarity. The callers load data
//! and persist results; nothing in this module touches the database.

pub mod aggregate;
pub mod calculator;
pub mod profile;
pub mod restrictions;
pub mod similarity;
pub mod units;

use thiserror::Error;

/// Errors surfaced by the computation core
///
/// Physiologically impossible but parseable medical data degrades to an
/// `Uncomputable` result instead (see `calculator`); only genuinely
/// malformed input is rejected here.
#[derive(Debug, Error, PartialEq)]
pub enum NutritionError {
    #[error("Invalid quantity: {0} (must be a non-negative number)")]
    InvalidQuantity(f64),
}
