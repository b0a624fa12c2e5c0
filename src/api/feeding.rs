use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::auth::TokenClaims;
use crate::entities::{animal, feeding_record};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RecordFeedingRequest {
    asset_id: i32,
    feed_type: String,
    quantity_kg: f64,
    notes: Option<String>,
    recorded_at: Option<chrono::NaiveDateTime>,
}

fn validate(payload: &RecordFeedingRequest) -> Result<(), ApiError> {
    if payload.feed_type.trim().is_empty() {
        return Err(ApiError::Validation("feed_type must not be empty".to_string()));
    }
    if !payload.quantity_kg.is_finite() || payload.quantity_kg <= 0.0 {
        return Err(ApiError::Validation(
            "quantity_kg must be positive".to_string(),
        ));
    }
    Ok(())
}

// POST /feeding
pub async fn record_feeding(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Json(payload): Json<RecordFeedingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&payload)?;

    let user = super::current_user(&db, &claims).await?;
    let animal = super::owned_animal(&db, user.id, payload.asset_id).await?;

    let recorded_at = payload
        .recorded_at
        .unwrap_or_else(|| chrono::Utc::now().naive_utc());

    let record = feeding_record::ActiveModel {
        animal_id: Set(animal.id),
        feed_type: Set(payload.feed_type.trim().to_string()),
        quantity_kg: Set(payload.quantity_kg),
        notes: Set(payload.notes),
        recorded_at: Set(recorded_at),
        ..Default::default()
    };
    let created = record.insert(&*db).await?;

    tracing::Span::current()
        .record("farm_id", user.id)
        .record("animal_id", animal.id)
        .record("business_event", "feeding recorded");
    crate::metrics::increment_feeding_recorded();

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct ListFeedingQuery {
    animal_id: Option<i32>,
}

#[derive(Serialize)]
pub struct FeedingRecordResponse {
    pub id: i32,
    pub animal_id: i32,
    pub animal_tag_id: Option<String>,
    pub feed_type: String,
    pub quantity_kg: f64,
    pub notes: Option<String>,
    pub recorded_at: chrono::NaiveDateTime,
}

// GET /feeding
pub async fn list_feeding(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Query(query): Query<ListFeedingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    let mut select = feeding_record::Entity::find()
        .find_also_related(animal::Entity)
        .filter(animal::Column::FarmId.eq(user.id));

    if let Some(animal_id) = query.animal_id {
        select = select.filter(feeding_record::Column::AnimalId.eq(animal_id));
    }

    let rows = select
        .order_by_desc(feeding_record::Column::RecordedAt)
        .all(&*db)
        .await?;

    let response: Vec<FeedingRecordResponse> = rows
        .into_iter()
        .map(|(record, animal)| FeedingRecordResponse {
            id: record.id,
            animal_id: record.animal_id,
            animal_tag_id: animal.map(|a| a.tag_id),
            feed_type: record.feed_type,
            quantity_kg: record.quantity_kg,
            notes: record.notes,
            recorded_at: record.recorded_at,
        })
        .collect();

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(feed_type: &str, quantity_kg: f64) -> RecordFeedingRequest {
        RecordFeedingRequest {
            asset_id: 1,
            feed_type: feed_type.to_string(),
            quantity_kg,
            notes: None,
            recorded_at: None,
        }
    }

    #[test]
    fn test_feed_type_required() {
        assert!(validate(&request("Silage", 5.0)).is_ok());
        assert!(validate(&request("", 5.0)).is_err());
        assert!(validate(&request("   ", 5.0)).is_err());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate(&request("Silage", 0.0)).is_err());
        assert!(validate(&request("Silage", -2.0)).is_err());
        assert!(validate(&request("Silage", f64::INFINITY)).is_err());
    }
}
