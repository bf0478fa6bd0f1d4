//! RDM status tool
//!
//! Provides runtime status information about the RDM service, plus the
//! usage guide for AI assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Dietary tracking instructions for AI assistants
pub const RENAL_INSTRUCTIONS: &str = r#"
# RDM Dietary Tracking Instructions

This guide explains how to track a renal patient's diet using the Renal Diet
Manager (RDM) tools.

## Overview

RDM manages:
1. **Persons** - Patients and caregivers, with a medical profile per patient
2. **Food items** - Nutrient profiles stored per 100g (solids) or 100ml (liquids)
3. **Measurement units** - Household measures ("Cup", "Soup spoon") with a
   gram or milliliter equivalence
4. **Recipes and meal plans** - Weekly plans built from recipes
5. **Restrictions** - Named sets of nutrient bounds (e.g. "renal-safe")
6. **Food log** - What the patient actually ate
7. **Image analysis** - Photo-based food recognition with a renal verdict

## Key Concepts

### Per-100 storage
All food items store nutrients per 100g or 100ml. Portion math goes through
measurement units: a "Cup" with a 200ml equivalence scales per-100ml values
by 2.0 per cup. Quantities logged without a unit are taken as grams/ml
directly (150 with no unit = 1.5x the stored values).

### Renal-critical nutrients
Sodium, potassium, phosphorus, and protein are the nutrients that matter
most for chronic kidney disease. Bounds on them come from restrictions, not
hardcoded thresholds. Run `seed_restrictions` once to install the default
"renal-safe" set.

### Derived values
- Age is always derived from the birth date; never ask for it separately.
- BMI and daily calories come from the medical profile. When measurements
  are implausible (height <= 0), the tools return null with a reason instead
  of failing - relay the reason, don't retry blindly.
- Daily calories can be snapped to the standard meal-plan tiers
  (1400/1600/1800/2000 kcal) with `categorize: true`.

## Step-by-Step Workflows

### Setting up a patient

1. `set_person(first_name, last_name, birth_date, sex)`
2. `set_medical_profile(person_id, weight_kg, height_m, dialysis, activity_level)`
3. `get_medical_profile(person_id)` - returns BMI, daily calories, calorie tier

### Logging a meal

1. `search_food_items(query: "chicken")` - fuzzy search; exact and substring
   matches are preferred, edit-distance matches are the fallback
2. `log_food(person_id, food_item_id, quantity, unit_id)` - totals for the
   portion are computed and stored with the entry
3. `daily_intake(person_id, start_date, end_date)` - per-day totals with a
   compliance verdict against a restriction

### Evaluating a meal plan

1. `create_meal_plan(...)` and `add_meal_plan_detail(...)` for each
   day-of-week x meal slot (free text or recipe_id)
2. `attach_plan_restriction(plan_id, restriction_id)`
3. `aggregate_meal_plan(plan_id, grouping: "day_of_week")` - nutrient totals
4. `evaluate_meal_plan(plan_id)` - totals checked against every bound of
   every attached restriction

Ingredients with missing food references or quantities are skipped and
reported in `warnings`; the rest of the aggregation still completes. Never
treat a non-empty `warnings` list as an error.

### Analyzing a food photo

1. `analyze_food_image(person_id, image_base64, image_ref)` - calls the
   vision model, normalizes the result, evaluates it against the
   "renal-safe" restriction, and stores the analysis
2. If the upstream call fails, the tool still succeeds with
   `analysis_failed: true`, zero totals, and a "could not be analyzed"
   recommendation - tell the user to retake the photo

### Weekly report

`generate_intake_report(person_id, end_date)` writes a PDF for the seven
days ending at `end_date`: a chart of sodium/potassium/phosphorus against
the restriction bounds plus a day-by-day table.

## Quick Reference

| Task | Tool |
|------|------|
| Create/update a person | `set_person` |
| Set anthropometric data | `set_medical_profile` |
| BMI + calories | `get_medical_profile`, `compute_energy_needs` |
| Find food items | `search_food_items` |
| Portion math | `portion_nutrients` |
| Log consumption | `log_food` |
| Day-by-day totals | `daily_intake` |
| Build a plan | `create_meal_plan`, `add_meal_plan_detail` |
| Plan totals | `aggregate_meal_plan` |
| Plan compliance | `evaluate_meal_plan` |
| Photo analysis | `analyze_food_image` |
| Weekly PDF | `generate_intake_report` |

## Notes

- Dates use ISO format: YYYY-MM-DD
- Recipe dietary flags (low_sodium etc.) are author-declared; `get_recipe`
  reports `flag_warnings` when the computed totals contradict a declared
  flag. The flags are never rewritten automatically.
- Food log entries are immutable once created, except for their notes.
"#;

/// Runtime status of the RDM service
#[derive(Debug, Clone, Serialize)]
pub struct RdmStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Vision model availability
    pub vision_configured: bool,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    vision_configured: bool,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf, vision_configured: bool) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            vision_configured,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> RdmStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        RdmStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            vision_configured: self.vision_configured,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
