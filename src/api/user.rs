use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, SqlErr};
use serde::{Deserialize, Serialize};

use crate::auth::TokenClaims;
use crate::entities::user;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    phone_number: String,
    name: Option<String>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub firebase_uid: String,
    pub phone_number: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: chrono::NaiveDateTime,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            firebase_uid: model.firebase_uid,
            phone_number: model.phone_number,
            name: model.name,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

// A unique violation on registration can come from either index on users.
// The constraint name in the driver message tells the caller which field
// actually collided.
fn registration_conflict(msg: &str) -> ApiError {
    if msg.contains("phone_number") {
        ApiError::Conflict("phone number already in use".to_string())
    } else {
        ApiError::Conflict("user already registered".to_string())
    }
}

// POST /users/register
pub async fn register(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let phone_number = payload.phone_number.trim().to_string();
    if phone_number.is_empty() {
        return Err(ApiError::Validation("phone_number must not be empty".to_string()));
    }

    let now = chrono::Utc::now().naive_utc();
    let new_user = user::ActiveModel {
        firebase_uid: Set(claims.sub.clone()),
        phone_number: Set(phone_number),
        name: Set(payload.name),
        role: Set("Owner".to_string()),
        created_at: Set(now),
        ..Default::default()
    };

    // Concurrent registrations for one identity race on the unique index:
    // exactly one insert wins, the loser surfaces here as Conflict.
    let created = new_user.insert(&*db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => registration_conflict(&msg),
        _ => ApiError::from(e),
    })?;

    tracing::Span::current()
        .record("farm_id", created.id)
        .record("business_event", "user registered");
    crate::metrics::increment_users_registered();

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

// GET /users/me
pub async fn me(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;
    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_uid_reports_already_registered() {
        let err = registration_conflict(
            "duplicate key value violates unique constraint \"users_firebase_uid_key\"",
        );
        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "user already registered"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_phone_reports_phone_in_use() {
        let err = registration_conflict(
            "duplicate key value violates unique constraint \"users_phone_number_key\"",
        );
        match err {
            ApiError::Conflict(msg) => assert_eq!(msg, "phone number already in use"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }
}
