//! Person and medical profile tools
//!
//! Person management plus the derived values: BMI, daily caloric needs, and
//! the standard calorie tier. Uncomputable values come back as null with a
//! reason, never as an error.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    ActivityLevel, MedicalProfile, MedicalProfileUpsert, Person, PersonCreate, Sex,
};
use crate::nutrition::calculator::{
    compute_bmi, compute_daily_calories, nearest_calorie_tier, EnergyInput,
};

/// Response for set_person
#[derive(Debug, Serialize)]
pub struct PersonResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub sex: Sex,
    pub age_years: Option<u32>,
    pub active: bool,
}

/// Response for list_persons
#[derive(Debug, Serialize)]
pub struct ListPersonsResponse {
    pub persons: Vec<PersonResponse>,
    pub count: usize,
}

/// A derived value, or the reason it could not be derived
#[derive(Debug, Serialize)]
pub struct Derived<T: Serialize> {
    pub value: Option<T>,
    pub reason: Option<String>,
}

impl<T: Serialize> Derived<T> {
    fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self {
                value: Some(value),
                reason: None,
            },
            Err(reason) => Self {
                value: None,
                reason: Some(reason.to_string()),
            },
        }
    }
}

/// Medical profile with derived values
#[derive(Debug, Serialize)]
pub struct MedicalProfileResponse {
    pub person_id: i64,
    pub weight_kg: f64,
    pub height_m: f64,
    pub dialysis: String,
    pub activity_level: String,
    pub bmi: Derived<f64>,
    pub daily_calories: Derived<u32>,
    pub calorie_tier: Option<u32>,
    pub updated_at: String,
}

/// Response for compute_energy_needs
#[derive(Debug, Serialize)]
pub struct EnergyNeedsResponse {
    pub bmi: Derived<f64>,
    pub daily_calories: Derived<u32>,
    pub calorie_tier: Option<u32>,
    pub renal_adjustment: bool,
}

fn person_response(person: Person) -> PersonResponse {
    let age_years = person.age_years();
    PersonResponse {
        id: person.id,
        first_name: person.first_name,
        last_name: person.last_name,
        birth_date: person.birth_date,
        sex: person.sex,
        age_years,
        active: person.active,
    }
}

/// Create a person
pub fn set_person(db: &Database, data: PersonCreate) -> Result<PersonResponse, String> {
    if data.first_name.trim().is_empty() {
        return Err("first_name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let person = Person::create(&conn, &data)
        .map_err(|e| format!("Failed to create person: {}", e))?;

    Ok(person_response(person))
}

/// Get a person with derived age
pub fn get_person(db: &Database, id: i64) -> Result<Option<PersonResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let person = Person::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get person: {}", e))?;

    Ok(person.map(person_response))
}

/// List persons
pub fn list_persons(db: &Database, limit: i64, offset: i64) -> Result<ListPersonsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let persons = Person::list(&conn, limit, offset)
        .map_err(|e| format!("Failed to list persons: {}", e))?;

    let persons: Vec<PersonResponse> = persons.into_iter().map(person_response).collect();
    let count = persons.len();

    Ok(ListPersonsResponse { persons, count })
}

/// Update a person
///
/// Changing the birth date changes the derived age on the next read; there
/// is no stored age to refresh.
#[allow(clippy::too_many_arguments)]
pub fn update_person(
    db: &Database,
    id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
    birth_date: Option<&str>,
    sex: Option<Sex>,
    active: Option<bool>,
) -> Result<Option<PersonResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let person = Person::update(&conn, id, first_name, last_name, birth_date, sex, active)
        .map_err(|e| format!("Failed to update person: {}", e))?;

    Ok(person.map(person_response))
}

/// Delete a person and everything they own
///
/// Cascades to the medical profile, food log, and image analyses.
pub fn delete_person(db: &Database, id: i64) -> Result<bool, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Person::delete(&conn, id).map_err(|e| format!("Failed to delete person: {}", e))
}

/// Create or replace a person's medical profile
pub fn set_medical_profile(
    db: &Database,
    data: MedicalProfileUpsert,
) -> Result<MedicalProfileResponse, String> {
    // The schema enforces these too; rejecting here gives a readable message
    if data.weight_kg <= 0.0 || data.weight_kg >= 500.0 {
        return Err("weight_kg must be between 0 and 500 (exclusive)".to_string());
    }
    if data.height_m <= 0.0 || data.height_m >= 3.0 {
        return Err("height_m must be between 0 and 3 (exclusive)".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let person = Person::get_by_id(&conn, data.person_id)
        .map_err(|e| format!("Database error checking person: {}", e))?;
    let person = match person {
        Some(p) => p,
        None => return Err(format!("Person not found with id: {}", data.person_id)),
    };

    let profile = MedicalProfile::upsert(&conn, &data)
        .map_err(|e| format!("Failed to set medical profile: {}", e))?;

    Ok(profile_response(&person, &profile))
}

/// Get a person's medical profile with derived values
pub fn get_medical_profile(
    db: &Database,
    person_id: i64,
) -> Result<Option<MedicalProfileResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let person = Person::get_by_id(&conn, person_id)
        .map_err(|e| format!("Database error checking person: {}", e))?;
    let person = match person {
        Some(p) => p,
        None => return Err(format!("Person not found with id: {}", person_id)),
    };

    let profile = MedicalProfile::get_for_person(&conn, person_id)
        .map_err(|e| format!("Failed to get medical profile: {}", e))?;

    Ok(profile.map(|profile| profile_response(&person, &profile)))
}

fn profile_response(person: &Person, profile: &MedicalProfile) -> MedicalProfileResponse {
    let bmi = Derived::from_result(compute_bmi(profile.weight_kg, profile.height_m));

    let calories = compute_daily_calories(&EnergyInput {
        weight_kg: profile.weight_kg,
        height_m: profile.height_m,
        age_years: person.age_years(),
        sex: person.sex,
        activity: profile.activity_level,
        renal_adjustment: true,
    });
    let calorie_tier = calories.as_ref().ok().map(|&c| nearest_calorie_tier(c));

    MedicalProfileResponse {
        person_id: profile.person_id,
        weight_kg: profile.weight_kg,
        height_m: profile.height_m,
        dialysis: profile.dialysis.as_str().to_string(),
        activity_level: profile.activity_level.as_str().to_string(),
        bmi,
        daily_calories: Derived::from_result(calories),
        calorie_tier,
        updated_at: profile.updated_at.clone(),
    }
}

/// Direct calorie/BMI computation without a stored profile
#[allow(clippy::too_many_arguments)]
pub fn compute_energy_needs(
    weight_kg: f64,
    height_m: f64,
    age_years: Option<u32>,
    sex: &str,
    activity_level: &str,
    renal_adjustment: bool,
    categorize: bool,
) -> EnergyNeedsResponse {
    let bmi = Derived::from_result(compute_bmi(weight_kg, height_m));

    let calories = compute_daily_calories(&EnergyInput {
        weight_kg,
        height_m,
        age_years,
        sex: Sex::from_str(sex),
        activity: ActivityLevel::from_str(activity_level),
        renal_adjustment,
    });

    let calorie_tier = if categorize {
        calories.as_ref().ok().map(|&c| nearest_calorie_tier(c))
    } else {
        None
    };

    EnergyNeedsResponse {
        bmi,
        daily_calories: Derived::from_result(calories),
        calorie_tier,
        renal_adjustment,
    }
}
