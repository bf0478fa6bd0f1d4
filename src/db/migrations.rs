//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PERSONS
        -- Patients and caregivers
        -- ============================================
        CREATE TABLE persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            birth_date TEXT NOT NULL,            -- ISO date: "1961-10-22"; age is derived, never stored
            sex TEXT NOT NULL CHECK(sex IN ('male', 'female', 'unspecified')) DEFAULT 'unspecified',
            active INTEGER NOT NULL DEFAULT 1,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_persons_name ON persons(last_name, first_name);

        -- ============================================
        -- MEDICAL PROFILES
        -- One per person; anthropometric data for BMI/calorie formulas
        -- ============================================
        CREATE TABLE medical_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL UNIQUE REFERENCES persons(id) ON DELETE CASCADE,
            weight_kg REAL NOT NULL CHECK(weight_kg > 0 AND weight_kg < 500),
            height_m REAL NOT NULL CHECK(height_m > 0 AND height_m < 3),
            dialysis TEXT NOT NULL CHECK(dialysis IN ('hemodialysis', 'peritoneal', 'both')) DEFAULT 'hemodialysis',
            activity_level TEXT NOT NULL CHECK(activity_level IN ('sedentary', 'light', 'moderate', 'high', 'very_high')) DEFAULT 'sedentary',

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- MEASUREMENT UNITS
        -- Household measures with a volume OR mass equivalence
        -- ============================================
        CREATE TABLE measurement_units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            ml_equivalence REAL,                 -- milliliters per unit (volume measures)
            g_equivalence REAL,                  -- grams per unit (mass measures)
            is_volume INTEGER NOT NULL DEFAULT 1,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- FOOD ITEMS
        -- Canonical nutrient profiles per 100g/100ml
        -- ============================================
        CREATE TABLE food_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            category TEXT,

            -- Macronutrients (per 100g/100ml)
            energy REAL NOT NULL DEFAULT 0,      -- kcal
            protein REAL NOT NULL DEFAULT 0,     -- grams
            carbohydrates REAL NOT NULL DEFAULT 0, -- grams
            sugars REAL NOT NULL DEFAULT 0,      -- grams
            fiber REAL NOT NULL DEFAULT 0,       -- grams
            total_fat REAL NOT NULL DEFAULT 0,   -- grams
            saturated_fat REAL NOT NULL DEFAULT 0,
            monounsaturated_fat REAL NOT NULL DEFAULT 0,
            polyunsaturated_fat REAL NOT NULL DEFAULT 0,
            trans_fat REAL NOT NULL DEFAULT 0,
            cholesterol REAL NOT NULL DEFAULT 0, -- milligrams

            -- Vitamins (nullable: incompletely catalogued items)
            vitamin_a REAL,
            vitamin_c REAL,
            vitamin_d REAL,
            vitamin_e REAL,
            vitamin_k REAL,
            thiamin REAL,
            riboflavin REAL,
            niacin REAL,
            vitamin_b6 REAL,
            vitamin_b12 REAL,
            folate REAL,

            -- Minerals (milligrams; nullable)
            sodium REAL,
            potassium REAL,
            calcium REAL,
            phosphorus REAL,
            magnesium REAL,
            iron REAL,
            zinc REAL,
            copper REAL,
            selenium REAL,

            alcohol REAL,

            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_items_name ON food_items(name);
        CREATE INDEX idx_food_items_category ON food_items(category);

        -- ============================================
        -- RECIPES
        -- Preparations with declared dietary flags
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            preparation TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL CHECK(kind IN ('starter', 'main_course', 'main_dish', 'dessert_snack')) DEFAULT 'main_course',

            -- Declared (author-set) dietary flags; not derived from ingredients
            low_sodium INTEGER NOT NULL DEFAULT 0,
            low_potassium INTEGER NOT NULL DEFAULT 0,
            low_phosphorus INTEGER NOT NULL DEFAULT 0,
            low_protein INTEGER NOT NULL DEFAULT 0,

            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        -- ============================================
        -- RECIPE INGREDIENTS
        -- Junction table: food items in recipes with quantity and unit
        -- ============================================
        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            food_item_id INTEGER NOT NULL REFERENCES food_items(id) ON DELETE RESTRICT,
            quantity REAL NOT NULL,
            unit_id INTEGER REFERENCES measurement_units(id) ON DELETE SET NULL,

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(recipe_id, food_item_id)
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_food ON recipe_ingredients(food_item_id);

        -- ============================================
        -- MEAL PLANS (minutas)
        -- ============================================
        CREATE TABLE meal_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            target_sex TEXT CHECK(target_sex IN ('male', 'female', 'unspecified')),
            low_sodium INTEGER NOT NULL DEFAULT 0,
            low_potassium INTEGER NOT NULL DEFAULT 0,
            low_phosphorus INTEGER NOT NULL DEFAULT 0,
            low_protein INTEGER NOT NULL DEFAULT 0,
            target_calories REAL,
            dialysis TEXT CHECK(dialysis IN ('hemodialysis', 'peritoneal', 'both')),

            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- MEAL PLAN DETAILS
        -- Day-of-week x meal slot entries; free text or recipe reference
        -- ============================================
        CREATE TABLE meal_plan_details (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            day_of_week TEXT CHECK(day_of_week IN ('monday', 'tuesday', 'wednesday', 'thursday', 'friday', 'saturday', 'sunday')),
            meal_kind TEXT NOT NULL CHECK(meal_kind IN ('breakfast', 'lunch', 'dinner', 'snack', 'unspecified')) DEFAULT 'unspecified',
            recipe_id INTEGER REFERENCES recipes(id) ON DELETE SET NULL,
            description TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meal_plan_details_plan ON meal_plan_details(plan_id);

        -- ============================================
        -- NUTRIENT CODES / RESTRICTIONS / BOUNDS
        -- A restriction is a named set of per-nutrient min/max bounds
        -- ============================================
        CREATE TABLE nutrient_codes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL UNIQUE,
            unit TEXT                            -- display unit: "mg", "g", "kcal"
        );

        CREATE TABLE restrictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,

            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE restriction_bounds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            restriction_id INTEGER NOT NULL REFERENCES restrictions(id) ON DELETE CASCADE,
            nutrient_code_id INTEGER NOT NULL REFERENCES nutrient_codes(id) ON DELETE CASCADE,
            min_value REAL,
            max_value REAL,

            UNIQUE(restriction_id, nutrient_code_id),
            CHECK(min_value IS NULL OR max_value IS NULL OR min_value <= max_value)
        );

        CREATE INDEX idx_restriction_bounds_restriction ON restriction_bounds(restriction_id);

        CREATE TABLE meal_plan_restrictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            restriction_id INTEGER NOT NULL REFERENCES restrictions(id) ON DELETE CASCADE,

            UNIQUE(plan_id, restriction_id)
        );

        -- ============================================
        -- FOOD LOG
        -- Consumption records; totals cached at write time
        -- ============================================
        CREATE TABLE food_log_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
            food_item_id INTEGER REFERENCES food_items(id) ON DELETE SET NULL,
            unit_id INTEGER REFERENCES measurement_units(id) ON DELETE SET NULL,
            quantity REAL NOT NULL,
            consumed_at TEXT NOT NULL DEFAULT (datetime('now')),

            -- Cached renal-critical totals for the consumed portion
            cached_energy REAL NOT NULL DEFAULT 0,
            cached_protein REAL NOT NULL DEFAULT 0,
            cached_sodium REAL NOT NULL DEFAULT 0,
            cached_potassium REAL NOT NULL DEFAULT 0,
            cached_phosphorus REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_food_log_person ON food_log_entries(person_id);
        CREATE INDEX idx_food_log_consumed ON food_log_entries(consumed_at);

        -- ============================================
        -- IMAGE ANALYSES
        -- Vision-model results; written once, never mutated
        -- ============================================
        CREATE TABLE image_analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id INTEGER NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
            image_ref TEXT NOT NULL,
            display_name TEXT NOT NULL,
            renal_compatible INTEGER NOT NULL DEFAULT 0,
            result_json TEXT NOT NULL,           -- normalized analysis payload
            analyzed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_image_analyses_person ON image_analyses(person_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_migrations_apply_and_are_idempotent() {
        let db = Database::in_memory().unwrap();

        db.with_conn(|conn| {
            assert!(needs_migration(conn).unwrap());

            run_migrations(conn)?;
            assert_eq!(get_schema_version(conn).unwrap(), SCHEMA_VERSION);
            assert!(!needs_migration(conn).unwrap());

            // Running again must not fail or bump the version
            run_migrations(conn)?;
            assert_eq!(get_schema_version(conn).unwrap(), SCHEMA_VERSION);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_schema_enforces_profile_checks() {
        let db = Database::in_memory().unwrap();

        db.with_conn(|conn| {
            run_migrations(conn)?;

            conn.execute(
                "INSERT INTO persons (first_name, last_name, birth_date, sex) VALUES ('A', 'B', '1980-01-01', 'female')",
                [],
            )?;

            // Implausible weight is rejected by the CHECK constraint
            let result = conn.execute(
                "INSERT INTO medical_profiles (person_id, weight_kg, height_m) VALUES (1, 600.0, 1.7)",
                [],
            );
            assert!(result.is_err());

            Ok(())
        })
        .unwrap();
    }
}
