pub mod feeding;
pub mod herd;
pub mod middleware;
pub mod milk;
pub mod user;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::auth::TokenClaims;
use crate::entities::{animal, user as user_entity};
use crate::error::ApiError;

/// Resolve the verified token subject to a registered user, or 404.
pub(crate) async fn current_user(
    db: &DatabaseConnection,
    claims: &TokenClaims,
) -> Result<user_entity::Model, ApiError> {
    user_entity::Entity::find()
        .filter(user_entity::Column::FirebaseUid.eq(claims.sub.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(
                "user not registered, call POST /users/register first".to_string(),
            )
        })
}

/// Fetch an animal only if the caller's farm owns it. A missing animal and
/// somebody else's animal are indistinguishable to the caller (403 for
/// both), so record writes can't be used to enumerate ids.
pub(crate) async fn owned_animal(
    db: &DatabaseConnection,
    farm_id: i32,
    animal_id: i32,
) -> Result<animal::Model, ApiError> {
    animal::Entity::find_by_id(animal_id)
        .filter(animal::Column::FarmId.eq(farm_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Forbidden("asset is not owned by the caller".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn claims(sub: &str) -> TokenClaims {
        TokenClaims {
            sub: sub.to_string(),
            phone_number: None,
            exp: 4_000_000_000,
        }
    }

    fn user_row(id: i32, firebase_uid: &str) -> user_entity::Model {
        user_entity::Model {
            id,
            firebase_uid: firebase_uid.to_string(),
            phone_number: "+919876543210".to_string(),
            name: Some("Asha".to_string()),
            role: "Owner".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn animal_row(id: i32, farm_id: i32) -> animal::Model {
        animal::Model {
            id,
            farm_id,
            tag_id: "B-101".to_string(),
            sra_id: "PK-BUF-2026-A1B2".to_string(),
            species: "Buffalo".to_string(),
            breed: Some("Nili-Ravi".to_string()),
            gender: "Female".to_string(),
            dob: None,
            status: "Active".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_current_user_resolves_registered_uid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_row(7, "uid-7")]])
            .into_connection();

        let user = current_user(&db, &claims("uid-7")).await.unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.firebase_uid, "uid-7");
    }

    #[tokio::test]
    async fn test_current_user_unregistered_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user_entity::Model>::new()])
            .into_connection();

        let err = current_user(&db, &claims("uid-unknown")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_owned_animal_returns_own_asset() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![animal_row(3, 7)]])
            .into_connection();

        let animal = owned_animal(&db, 7, 3).await.unwrap();
        assert_eq!(animal.id, 3);
        assert_eq!(animal.farm_id, 7);
    }

    #[tokio::test]
    async fn test_owned_animal_forbidden_for_other_farm_or_missing() {
        // The farm filter means an asset belonging to another farm and an
        // asset that does not exist both come back as no rows.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                Vec::<animal::Model>::new(),
                Vec::<animal::Model>::new(),
            ])
            .into_connection();

        let err = owned_animal(&db, 7, 999).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = owned_animal(&db, 8, 3).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
