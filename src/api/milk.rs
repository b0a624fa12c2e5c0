use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::auth::TokenClaims;
use crate::entities::{animal, milk_record};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RecordMilkRequest {
    asset_id: i32,
    liters: f64,
    session: Option<String>,
    fat_percentage: Option<f64>,
    recorded_at: Option<chrono::NaiveDateTime>,
}

fn validate(payload: &RecordMilkRequest) -> Result<(), ApiError> {
    if !payload.liters.is_finite() || payload.liters <= 0.0 {
        return Err(ApiError::Validation("liters must be positive".to_string()));
    }
    if let Some(session) = &payload.session {
        if session != "Morning" && session != "Evening" {
            return Err(ApiError::Validation(
                "session must be Morning or Evening".to_string(),
            ));
        }
    }
    if let Some(fat) = payload.fat_percentage {
        if !fat.is_finite() || !(0.0..=100.0).contains(&fat) {
            return Err(ApiError::Validation(
                "fat_percentage must be between 0 and 100".to_string(),
            ));
        }
    }
    Ok(())
}

// POST /milk
pub async fn record_milk(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Json(payload): Json<RecordMilkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&payload)?;

    let user = super::current_user(&db, &claims).await?;
    let animal = super::owned_animal(&db, user.id, payload.asset_id).await?;

    let recorded_at = payload
        .recorded_at
        .unwrap_or_else(|| chrono::Utc::now().naive_utc());

    let entry = milk_record::ActiveModel {
        animal_id: Set(animal.id),
        liters: Set(payload.liters),
        date: Set(recorded_at.date()),
        session: Set(payload.session),
        fat_percentage: Set(payload.fat_percentage),
        recorded_at: Set(recorded_at),
        ..Default::default()
    };
    let created = entry.insert(&*db).await?;

    tracing::Span::current()
        .record("farm_id", user.id)
        .record("animal_id", animal.id)
        .record("business_event", "milk recorded");
    crate::metrics::increment_milk_recorded(created.liters);

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct ListMilkQuery {
    animal_id: Option<i32>,
    session: Option<String>,
    start_date: Option<chrono::NaiveDate>,
    end_date: Option<chrono::NaiveDate>,
}

#[derive(Serialize)]
pub struct MilkRecordResponse {
    pub id: i32,
    pub animal_id: i32,
    pub animal_tag_id: Option<String>,
    pub animal_species: Option<String>,
    pub liters: f64,
    pub date: chrono::NaiveDate,
    pub session: Option<String>,
    pub fat_percentage: Option<f64>,
    pub recorded_at: chrono::NaiveDateTime,
}

// GET /milk
pub async fn list_milk(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Query(query): Query<ListMilkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    let mut select = milk_record::Entity::find()
        .find_also_related(animal::Entity)
        .filter(animal::Column::FarmId.eq(user.id));

    if let Some(animal_id) = query.animal_id {
        select = select.filter(milk_record::Column::AnimalId.eq(animal_id));
    }
    if let Some(session) = &query.session {
        select = select.filter(milk_record::Column::Session.eq(session.as_str()));
    }
    if let Some(start) = query.start_date {
        select = select.filter(milk_record::Column::Date.gte(start));
    }
    if let Some(end) = query.end_date {
        select = select.filter(milk_record::Column::Date.lte(end));
    }

    let rows = select
        .order_by_desc(milk_record::Column::RecordedAt)
        .all(&*db)
        .await?;

    let response: Vec<MilkRecordResponse> = rows
        .into_iter()
        .map(|(entry, animal)| MilkRecordResponse {
            id: entry.id,
            animal_id: entry.animal_id,
            animal_tag_id: animal.as_ref().map(|a| a.tag_id.clone()),
            animal_species: animal.map(|a| a.species),
            liters: entry.liters,
            date: entry.date,
            session: entry.session,
            fat_percentage: entry.fat_percentage,
            recorded_at: entry.recorded_at,
        })
        .collect();

    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct MilkStatsQuery {
    start_date: Option<chrono::NaiveDate>,
    end_date: Option<chrono::NaiveDate>,
}

#[derive(Serialize)]
pub struct DailyProduction {
    pub date: chrono::NaiveDate,
    pub liters: f64,
}

#[derive(Serialize)]
pub struct TopProducer {
    pub tag_id: String,
    pub total_liters: f64,
}

#[derive(Serialize)]
pub struct MilkStatsResponse {
    pub total_liters: f64,
    pub animal_count: i64,
    pub avg_per_animal: f64,
    pub daily_production: Vec<DailyProduction>,
    pub top_producers: Vec<TopProducer>,
}

fn stats_base(
    farm_id: i32,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Select<milk_record::Entity> {
    let mut select = milk_record::Entity::find()
        .join(JoinType::InnerJoin, milk_record::Relation::Animal.def())
        .filter(animal::Column::FarmId.eq(farm_id));
    if let Some(start) = start {
        select = select.filter(milk_record::Column::Date.gte(start));
    }
    if let Some(end) = end {
        select = select.filter(milk_record::Column::Date.lte(end));
    }
    select
}

// The seven-day default only applies when the caller supplied no bounds at
// all. An explicit end_date on its own means "everything up to that date",
// not "the week before it".
fn stats_window(
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
    today: chrono::NaiveDate,
) -> (Option<chrono::NaiveDate>, Option<chrono::NaiveDate>) {
    match (start, end) {
        (None, None) => (Some(today - chrono::Duration::days(6)), None),
        bounds => bounds,
    }
}

// GET /milk/stats
pub async fn milk_stats(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<TokenClaims>,
    Query(query): Query<MilkStatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = super::current_user(&db, &claims).await?;

    let (start, end) = stats_window(
        query.start_date,
        query.end_date,
        chrono::Utc::now().date_naive(),
    );

    let total_liters: f64 = stats_base(user.id, start, end)
        .select_only()
        .column_as(milk_record::Column::Liters.sum(), "total_liters")
        .into_tuple::<Option<f64>>()
        .one(&*db)
        .await?
        .flatten()
        .unwrap_or(0.0);

    let animal_count: i64 = stats_base(user.id, start, end)
        .select_only()
        .column_as(
            Expr::col((milk_record::Entity, milk_record::Column::AnimalId)).count_distinct(),
            "animal_count",
        )
        .into_tuple::<i64>()
        .one(&*db)
        .await?
        .unwrap_or(0);

    let avg_per_animal = if animal_count > 0 {
        total_liters / animal_count as f64
    } else {
        0.0
    };

    let daily: Vec<(chrono::NaiveDate, Option<f64>)> = stats_base(user.id, start, end)
        .select_only()
        .column(milk_record::Column::Date)
        .column_as(milk_record::Column::Liters.sum(), "liters")
        .group_by(milk_record::Column::Date)
        .order_by_asc(milk_record::Column::Date)
        .into_tuple()
        .all(&*db)
        .await?;

    let top: Vec<(String, Option<f64>)> = stats_base(user.id, start, end)
        .select_only()
        .column_as(animal::Column::TagId, "tag_id")
        .column_as(milk_record::Column::Liters.sum(), "total_liters")
        .group_by(animal::Column::TagId)
        .order_by_desc(milk_record::Column::Liters.sum())
        .limit(5)
        .into_tuple()
        .all(&*db)
        .await?;

    Ok(Json(MilkStatsResponse {
        total_liters,
        animal_count,
        avg_per_animal,
        daily_production: daily
            .into_iter()
            .map(|(date, liters)| DailyProduction {
                date,
                liters: liters.unwrap_or(0.0),
            })
            .collect(),
        top_producers: top
            .into_iter()
            .map(|(tag_id, total_liters)| TopProducer {
                tag_id,
                total_liters: total_liters.unwrap_or(0.0),
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(liters: f64, session: Option<&str>, fat: Option<f64>) -> RecordMilkRequest {
        RecordMilkRequest {
            asset_id: 1,
            liters,
            session: session.map(str::to_string),
            fat_percentage: fat,
            recorded_at: None,
        }
    }

    #[test]
    fn test_liters_must_be_positive() {
        assert!(validate(&request(4.5, None, None)).is_ok());
        assert!(validate(&request(0.0, None, None)).is_err());
        assert!(validate(&request(-1.0, None, None)).is_err());
        assert!(validate(&request(f64::NAN, None, None)).is_err());
    }

    #[test]
    fn test_session_values() {
        assert!(validate(&request(4.5, Some("Morning"), None)).is_ok());
        assert!(validate(&request(4.5, Some("Evening"), None)).is_ok());
        assert!(validate(&request(4.5, Some("Noon"), None)).is_err());
    }

    #[test]
    fn test_fat_percentage_range() {
        assert!(validate(&request(4.5, None, Some(6.2))).is_ok());
        assert!(validate(&request(4.5, None, Some(0.0))).is_ok());
        assert!(validate(&request(4.5, None, Some(100.0))).is_ok());
        assert!(validate(&request(4.5, None, Some(-0.1))).is_err());
        assert!(validate(&request(4.5, None, Some(101.0))).is_err());
    }

    #[test]
    fn test_stats_window_defaults_to_last_week() {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let week_ago = chrono::NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert_eq!(stats_window(None, None, today), (Some(week_ago), None));
    }

    #[test]
    fn test_stats_window_keeps_explicit_bounds() {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let start = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();

        // end_date alone leaves the start unbounded.
        assert_eq!(stats_window(None, Some(end), today), (None, Some(end)));
        assert_eq!(stats_window(Some(start), None, today), (Some(start), None));
        assert_eq!(
            stats_window(Some(start), Some(end), today),
            (Some(start), Some(end))
        );
    }
}
