//! Utility to seed the standard household measurement-unit catalog

use std::path::PathBuf;

use rdm::models::{MeasurementUnit, MeasurementUnitCreate};

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

/// Standard household measures: (name, ml_equivalence, g_equivalence, is_volume)
const UNITS: &[(&str, Option<f64>, Option<f64>, bool)] = &[
    ("Gram", None, Some(1.0), false),
    ("Milliliter", Some(1.0), None, true),
    ("Cup", Some(200.0), None, true),
    ("Glass", Some(180.0), None, true),
    ("Soup bowl", Some(250.0), None, true),
    ("Soup spoon", Some(10.0), None, true),
    ("Teaspoon", Some(5.0), None, true),
    ("Matchbox-size portion", None, Some(30.0), false),
    ("Bread roll (1/2 unit)", None, Some(50.0), false),
    ("Sliced bread (2 1/2 slices)", None, Some(60.0), false),
    ("Cooked rice (3/4 cup)", None, Some(130.0), false),
    ("Cooked noodles (3/4 cup)", None, Some(110.0), false),
    ("Cooked legumes (3/4 cup)", None, Some(140.0), false),
    ("Whole egg (1 unit)", None, Some(50.0), false),
    ("Milk (1 cup)", Some(200.0), None, true),
    ("Plain yogurt (1 unit)", Some(150.0), None, true),
    ("Cheese (2 slices)", None, Some(30.0), false),
    ("Olive oil (1 teaspoon)", Some(5.0), None, true),
    ("Butter (1 teaspoon)", None, Some(6.0), false),
    ("Strawberries (1 cup)", None, Some(200.0), false),
    ("Medium fruit (1 unit)", None, Some(120.0), false),
    ("Raw leafy vegetables (1 cup)", None, Some(50.0), false),
    ("Cooked vegetables (1/2 cup)", None, Some(100.0), false),
    ("Cooked meat (palm-size portion)", None, Some(100.0), false),
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

    // Seed units, skipping ones that already exist
    database.with_conn(|conn| {
        let mut created = 0;
        let mut skipped = 0;

        for &(name, ml_equivalence, g_equivalence, is_volume) in UNITS {
            if MeasurementUnit::get_by_name(conn, name)?.is_some() {
                skipped += 1;
                continue;
            }

            let unit = MeasurementUnit::create(
                conn,
                &MeasurementUnitCreate {
                    name: name.to_string(),
                    ml_equivalence,
                    g_equivalence,
                    is_volume,
                },
            )?;
            println!("  Created unit: {} (factor {})", unit.name, unit.factor());
            created += 1;
        }

        println!("Done: {} created, {} already present", created, skipped);
        Ok(())
    })?;

    Ok(())
}
