//! Image analysis tools
//!
//! Photo-based food recognition: call the vision model, normalize its
//! payload, match detected items against the catalog, evaluate the
//! estimated totals with the restriction engine, and persist the result.
//! Upstream failures degrade to the defined fallback payload; the tool
//! itself still succeeds.

use serde::Serialize;
use serde_json::json;

use crate::db::Database;
use crate::models::{FoodItem, ImageAnalysisRecord, NutrientTotals, Person};
use crate::nutrition::restrictions::{evaluate, resolve_bounds, ComplianceReport};
use crate::nutrition::similarity::FoodMatcher;
use crate::vision::{normalize, normalize_failure, EstimatedTotals, NormalizedAnalysis, VisionClient};

use super::restrictions::load_bounds_by_name;

/// Restriction the estimated totals are checked against
const ANALYSIS_REFERENCE_RESTRICTION: &str = "renal-safe";

/// A detected item matched against the food catalog
#[derive(Debug, Clone, Serialize)]
pub struct CatalogMatch {
    pub detected: String,
    pub food_item_id: Option<i64>,
    pub food_name: Option<String>,
}

/// Response for analyze_food_image
#[derive(Debug, Serialize)]
pub struct AnalyzeImageResponse {
    pub analysis_id: i64,
    pub display_name: String,
    pub detected_items: Vec<String>,
    pub catalog_matches: Vec<CatalogMatch>,
    pub totals: EstimatedTotals,
    pub recommendation: String,
    /// Final verdict: the restriction engine's when bounds are seeded,
    /// otherwise the model's own claim
    pub renal_compatible: bool,
    /// The model's claim, kept for reference
    pub model_claim: bool,
    pub compliance: Option<ComplianceReport>,
    pub analysis_failed: bool,
}

/// Response for list_image_analyses
#[derive(Debug, Serialize)]
pub struct ListAnalysesResponse {
    pub analyses: Vec<AnalysisSummary>,
    pub count: usize,
}

/// Stored analysis summary
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub id: i64,
    pub display_name: String,
    pub renal_compatible: bool,
    pub analyzed_at: String,
}

/// Analyze a food photo for a person
pub async fn analyze_food_image(
    db: &Database,
    client: &VisionClient,
    person_id: i64,
    image_base64: &str,
    image_ref: &str,
) -> Result<AnalyzeImageResponse, String> {
    {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let person = Person::get_by_id(&conn, person_id)
            .map_err(|e| format!("Database error checking person: {}", e))?;
        if person.is_none() {
            return Err(format!("Person not found with id: {}", person_id));
        }
    }

    // One attempt; failure substitutes the fallback payload instead of
    // surfacing an error to the caller
    let analysis = match client.analyze(image_base64).await {
        Ok(raw) => normalize(&raw.payload),
        Err(e) => {
            tracing::warn!(error = %e, "vision analysis failed, using fallback payload");
            normalize_failure(&e.to_string())
        }
    };

    finish_analysis(db, person_id, image_ref, analysis)
}

/// Normalize, evaluate, and persist an analysis payload
///
/// Split from the HTTP call so the full pipeline is testable without a
/// network.
pub fn finish_analysis(
    db: &Database,
    person_id: i64,
    image_ref: &str,
    analysis: NormalizedAnalysis,
) -> Result<AnalyzeImageResponse, String> {
    // Run the estimated totals through the same thresholds meal plans use
    let bounds = load_bounds_by_name(db, ANALYSIS_REFERENCE_RESTRICTION)?
        .map(|rows| resolve_bounds(&rows));

    let compliance = bounds.as_ref().map(|bounds| {
        let totals = NutrientTotals {
            energy: analysis.totals.energy,
            protein: analysis.totals.protein,
            sodium: analysis.totals.sodium,
            potassium: analysis.totals.potassium,
            phosphorus: analysis.totals.phosphorus,
            ..Default::default()
        };
        evaluate(&totals, bounds)
    });

    let model_claim = analysis.renal_compatible;
    let renal_compatible = match (&compliance, analysis.analysis_failed) {
        // A failed analysis is never compatible
        (_, true) => false,
        (Some(report), false) => report.compliant,
        (None, false) => model_claim,
    };

    let catalog_matches = match_detected_items(db, &analysis.detected_items)?;

    let result = json!({
        "analysis": &analysis,
        "compliance": &compliance,
        "catalog_matches": &catalog_matches,
    });

    let record = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        ImageAnalysisRecord::create(
            &conn,
            person_id,
            image_ref,
            &analysis.display_name,
            renal_compatible,
            &result,
        )
        .map_err(|e| format!("Failed to store analysis: {}", e))?
    };

    Ok(AnalyzeImageResponse {
        analysis_id: record.id,
        display_name: analysis.display_name,
        detected_items: analysis.detected_items,
        catalog_matches,
        totals: analysis.totals,
        recommendation: analysis.recommendation,
        renal_compatible,
        model_claim,
        compliance,
        analysis_failed: analysis.analysis_failed,
    })
}

/// Get a stored analysis
pub fn get_image_analysis(db: &Database, id: i64) -> Result<Option<ImageAnalysisRecord>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    ImageAnalysisRecord::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get analysis: {}", e))
}

/// List a person's analyses
pub fn list_image_analyses(
    db: &Database,
    person_id: i64,
    limit: i64,
    offset: i64,
) -> Result<ListAnalysesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let records = ImageAnalysisRecord::list_for_person(&conn, person_id, limit, offset)
        .map_err(|e| format!("Failed to list analyses: {}", e))?;

    let analyses: Vec<AnalysisSummary> = records
        .into_iter()
        .map(|r| AnalysisSummary {
            id: r.id,
            display_name: r.display_name,
            renal_compatible: r.renal_compatible,
            analyzed_at: r.analyzed_at,
        })
        .collect();
    let count = analyses.len();

    Ok(ListAnalysesResponse { analyses, count })
}

/// Best catalog match for each detected item
fn match_detected_items(
    db: &Database,
    detected: &[String],
) -> Result<Vec<CatalogMatch>, String> {
    if detected.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        FoodItem::list_active_names(&conn)
            .map_err(|e| format!("Failed to load food names: {}", e))?
    };

    let matcher = FoodMatcher::default();
    let matches = detected
        .iter()
        .map(|item| {
            let best = matcher.find_matches(item, &candidates).into_iter().next();
            CatalogMatch {
                detected: item.clone(),
                food_item_id: best.as_ref().map(|m| m.id),
                food_name: best.map(|m| m.name),
            }
        })
        .collect();

    Ok(matches)
}
