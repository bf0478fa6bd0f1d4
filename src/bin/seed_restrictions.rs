//! Utility to seed the default renal-safe restriction and its bounds

use std::path::PathBuf;

use rdm::models::{DietaryRestriction, NutrientCode, NutrientCodeRow, RestrictionBoundRow};

fn get_database_path() -> PathBuf {
    std::env::var("RDM_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            std::fs::create_dir_all(&path).ok();
            path.push("rdm.db");
            path
        })
}

/// Daily bounds for dialysis patients: (code, display name, unit, min, max)
const RENAL_SAFE_BOUNDS: &[(NutrientCode, &str, &str, Option<f64>, Option<f64>)] = &[
    (NutrientCode::Sodium, "Sodium", "mg", None, Some(2000.0)),
    (NutrientCode::Potassium, "Potassium", "mg", None, Some(2000.0)),
    (NutrientCode::Phosphorus, "Phosphorus", "mg", None, Some(1000.0)),
    (NutrientCode::Protein, "Protein", "g", None, Some(60.0)),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_database_path();
    println!("Database path: {}", db_path.display());

    let database = rdm::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        rdm::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    database.with_conn(|conn| {
        let restriction = match DietaryRestriction::get_by_name(conn, "renal-safe")? {
            Some(existing) => {
                println!("Restriction 'renal-safe' already present (id {})", existing.id);
                existing
            }
            None => {
                let created = DietaryRestriction::create(
                    conn,
                    "renal-safe",
                    Some("Daily nutrient bounds appropriate for chronic kidney disease patients"),
                )?;
                println!("Created restriction 'renal-safe' (id {})", created.id);
                created
            }
        };

        for &(code, name, unit, min, max) in RENAL_SAFE_BOUNDS {
            let code_row = NutrientCodeRow::ensure(conn, code, name, Some(unit))?;
            RestrictionBoundRow::upsert(conn, restriction.id, code_row.id, min, max)?;
            println!(
                "  Bound: {} min={:?} max={:?} {}",
                code.as_str(),
                min,
                max,
                unit
            );
        }

        println!("Done");
        Ok(())
    })?;

    Ok(())
}
