use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::TokenClaims;
use crate::entities::animal;
use crate::error::ApiError;

const SRA_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SRA_MAX_ATTEMPTS: usize = 5;

fn species_code(species: &str) -> &'static str {
    match species {
        "Buffalo" => "BUF",
        "Cow" => "COW",
        "Goat" => "GOA",
        "Horse" => "HOR",
        "Camel" => "CAM",
        _ => "ANI",
    }
}

/// Global asset id: PK-{SPECIES_CODE}-{YEAR}-{RAND4}.
fn generate_sra_id(species: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| SRA_CHARSET[rng.gen_range(0..SRA_CHARSET.len())] as char)
        .collect();
    format!(
        "PK-{}-{}-{}",
        species_code(species),
        chrono::Utc::now().year(),
        suffix
    )
}

fn default_status(gender: &str) -> &'static str {
    if gender == "Male" {
        "Calf"
    } else {
        "Heifer"
    }
}

#[derive(Deserialize)]
pub struct CreateAnimalRequest {
    tag_id: String,
    species: String,
    breed: Option<String>,
    gender: String,
    dob: Option<chrono::NaiveDate>,
    status: Option<String>,
}

// POST /assets
pub async fn create_animal(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Json(payload): Json<CreateAnimalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    let tag_id = payload.tag_id.trim().to_string();
    if tag_id.is_empty() {
        return Err(ApiError::Validation("tag_id must not be empty".to_string()));
    }
    if payload.species.trim().is_empty() {
        return Err(ApiError::Validation("species must not be empty".to_string()));
    }
    if payload.gender != "Male" && payload.gender != "Female" {
        return Err(ApiError::Validation(
            "gender must be Male or Female".to_string(),
        ));
    }

    // Up-front check for a readable message; the unique index on
    // (farm_id, tag_id) still backstops racing creates.
    let existing = animal::Entity::find()
        .filter(animal::Column::FarmId.eq(user.id))
        .filter(animal::Column::TagId.eq(tag_id.as_str()))
        .one(&*db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "tag '{tag_id}' already exists for this farm"
        )));
    }

    let status = payload
        .status
        .unwrap_or_else(|| default_status(&payload.gender).to_string());
    let now = chrono::Utc::now().naive_utc();

    // The random sra suffix can collide; regenerate a few times before
    // giving up.
    for _ in 0..SRA_MAX_ATTEMPTS {
        let new_animal = animal::ActiveModel {
            farm_id: Set(user.id),
            tag_id: Set(tag_id.clone()),
            sra_id: Set(generate_sra_id(&payload.species)),
            species: Set(payload.species.clone()),
            breed: Set(payload.breed.clone()),
            gender: Set(payload.gender.clone()),
            dob: Set(payload.dob),
            status: Set(status.clone()),
            created_at: Set(now),
            ..Default::default()
        };

        match new_animal.insert(&*db).await {
            Ok(created) => {
                tracing::Span::current()
                    .record("farm_id", user.id)
                    .record("animal_id", created.id)
                    .record("business_event", "animal created");
                crate::metrics::increment_animals_created(&created.species);
                return Ok((StatusCode::CREATED, Json(created)));
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("sra") => continue,
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    return Err(ApiError::Conflict(format!(
                        "tag '{tag_id}' already exists for this farm"
                    )))
                }
                _ => return Err(ApiError::from(e)),
            },
        }
    }

    Err(ApiError::Internal(
        "could not allocate a unique sra id".to_string(),
    ))
}

// GET /assets
pub async fn list_animals(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    // Insertion order.
    let animals = animal::Entity::find()
        .filter(animal::Column::FarmId.eq(user.id))
        .order_by_asc(animal::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(animals))
}

// GET /assets/:id
pub async fn get_animal(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Path(animal_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    let found = animal::Entity::find_by_id(animal_id)
        .filter(animal::Column::FarmId.eq(user.id))
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("animal not found".to_string()))?;

    Ok(Json(found))
}

// DELETE /assets/:id
pub async fn delete_animal(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Path(animal_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    let found = animal::Entity::find_by_id(animal_id)
        .filter(animal::Column::FarmId.eq(user.id))
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("animal not found".to_string()))?;

    // Milk and feeding records go with it (FK cascade).
    found.delete(&*db).await?;

    tracing::Span::current()
        .record("farm_id", user.id)
        .record("animal_id", animal_id)
        .record("business_event", "animal deleted");

    Ok(Json(json!({"message": "animal deleted"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_codes() {
        assert_eq!(species_code("Buffalo"), "BUF");
        assert_eq!(species_code("Cow"), "COW");
        assert_eq!(species_code("Goat"), "GOA");
        assert_eq!(species_code("Horse"), "HOR");
        assert_eq!(species_code("Camel"), "CAM");
        assert_eq!(species_code("Yak"), "ANI");
    }

    #[test]
    fn test_sra_id_format() {
        let id = generate_sra_id("Cow");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "PK");
        assert_eq!(parts[1], "COW");
        assert_eq!(parts[2], chrono::Utc::now().year().to_string());
        assert_eq!(parts[3].len(), 4);
        assert!(parts[3]
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_sra_ids_vary() {
        // Four random chars over 36 symbols; 20 draws colliding would mean a
        // broken generator, not bad luck.
        let ids: std::collections::HashSet<String> =
            (0..20).map(|_| generate_sra_id("Buffalo")).collect();
        assert!(ids.len() > 1);
    }

    #[test]
    fn test_default_status() {
        assert_eq!(default_status("Male"), "Calf");
        assert_eq!(default_status("Female"), "Heifer");
    }
}
