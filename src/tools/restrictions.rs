//! Dietary restriction tools
//!
//! Restriction and bound management, plus the helper the other tools use to
//! load a restriction's bounds by name.

use serde::Serialize;

use crate::db::Database;
use crate::models::{DietaryRestriction, NutrientCode, NutrientCodeRow, RestrictionBoundRow};

/// Response for add_restriction
#[derive(Debug, Serialize)]
pub struct AddRestrictionResponse {
    pub id: i64,
    pub name: String,
}

/// Response for add_restriction_bound
#[derive(Debug, Serialize)]
pub struct AddBoundResponse {
    pub restriction_id: i64,
    pub nutrient_code: NutrientCode,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// A restriction with its bounds
#[derive(Debug, Serialize)]
pub struct RestrictionDetail {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub bounds: Vec<BoundSummary>,
}

/// One bound row
#[derive(Debug, Serialize)]
pub struct BoundSummary {
    pub nutrient_code: NutrientCode,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Response for list_restrictions
#[derive(Debug, Serialize)]
pub struct ListRestrictionsResponse {
    pub restrictions: Vec<RestrictionDetail>,
    pub count: usize,
}

/// Create a restriction
pub fn add_restriction(
    db: &Database,
    name: &str,
    description: Option<&str>,
) -> Result<AddRestrictionResponse, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Restriction name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let restriction = DietaryRestriction::create(&conn, name, description)
        .map_err(|e| format!("Failed to create restriction: {}", e))?;

    Ok(AddRestrictionResponse {
        id: restriction.id,
        name: restriction.name,
    })
}

/// Add or replace a bound on a restriction
pub fn add_restriction_bound(
    db: &Database,
    restriction_id: i64,
    nutrient_code: &str,
    nutrient_name: Option<&str>,
    unit: Option<&str>,
    min_value: Option<f64>,
    max_value: Option<f64>,
) -> Result<AddBoundResponse, String> {
    if min_value.is_none() && max_value.is_none() {
        return Err("A bound needs at least one of min_value, max_value".to_string());
    }
    if let (Some(min), Some(max)) = (min_value, max_value) {
        if min > max {
            return Err(format!("min_value {} exceeds max_value {}", min, max));
        }
    }

    let code = NutrientCode::from_str(nutrient_code);
    if code == NutrientCode::Unknown {
        return Err(format!("Unknown nutrient code: {}", nutrient_code));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let restriction = DietaryRestriction::get_by_id(&conn, restriction_id)
        .map_err(|e| format!("Database error checking restriction: {}", e))?;
    if restriction.is_none() {
        return Err(format!("Restriction not found with id: {}", restriction_id));
    }

    let code_row = NutrientCodeRow::ensure(
        &conn,
        code,
        nutrient_name.unwrap_or(code.as_str()),
        unit,
    )
    .map_err(|e| format!("Failed to register nutrient code: {}", e))?;

    RestrictionBoundRow::upsert(&conn, restriction_id, code_row.id, min_value, max_value)
        .map_err(|e| format!("Failed to set bound: {}", e))?;

    Ok(AddBoundResponse {
        restriction_id,
        nutrient_code: code,
        min_value,
        max_value,
    })
}

/// List restrictions with their bounds
pub fn list_restrictions(db: &Database) -> Result<ListRestrictionsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let restrictions = DietaryRestriction::list(&conn)
        .map_err(|e| format!("Failed to list restrictions: {}", e))?;

    let mut details = Vec::with_capacity(restrictions.len());
    for restriction in restrictions {
        let bounds = RestrictionBoundRow::get_for_restrictions(&conn, &[restriction.id])
            .map_err(|e| format!("Failed to load bounds: {}", e))?;

        details.push(RestrictionDetail {
            id: restriction.id,
            name: restriction.name,
            description: restriction.description,
            bounds: bounds
                .into_iter()
                .map(|b| BoundSummary {
                    nutrient_code: b.nutrient_code,
                    min_value: b.min_value,
                    max_value: b.max_value,
                })
                .collect(),
        });
    }

    let count = details.len();

    Ok(ListRestrictionsResponse {
        restrictions: details,
        count,
    })
}

/// Response for list_nutrient_codes
#[derive(Debug, Serialize)]
pub struct ListNutrientCodesResponse {
    pub codes: Vec<NutrientCodeRow>,
    pub count: usize,
}

/// List the registered nutrient codes
pub fn list_nutrient_codes(db: &Database) -> Result<ListNutrientCodesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let codes = NutrientCodeRow::list(&conn)
        .map_err(|e| format!("Failed to list nutrient codes: {}", e))?;
    let count = codes.len();

    Ok(ListNutrientCodesResponse { codes, count })
}

/// Bounds of a restriction looked up by name; None when not seeded
pub fn load_bounds_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Vec<RestrictionBoundRow>>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let restriction = DietaryRestriction::get_by_name(&conn, name)
        .map_err(|e| format!("Database error: {}", e))?;

    match restriction {
        Some(restriction) => {
            let bounds = RestrictionBoundRow::get_for_restrictions(&conn, &[restriction.id])
                .map_err(|e| format!("Failed to load bounds: {}", e))?;
            Ok(Some(bounds))
        }
        None => Ok(None),
    }
}
