use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use crate::entities::{animal, feeding_record, milk_record, user};

/// Seed the total gauges from the database at startup so dashboards don't
/// reset to zero on every deploy.
pub async fn init_metrics(db: &DatabaseConnection) {
    let user_count = user::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("apnifarm_users_total").set(user_count as f64);

    let animal_count = animal::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("apnifarm_animals_total").set(animal_count as f64);

    let milk_count = milk_record::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("apnifarm_milk_entries_total").set(milk_count as f64);

    let feeding_count = feeding_record::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("apnifarm_feeding_records_total").set(feeding_count as f64);

    tracing::info!(
        "Initialized metrics: Users={}, Animals={}, MilkEntries={}, FeedingRecords={}",
        user_count,
        animal_count,
        milk_count,
        feeding_count
    );
}

pub fn increment_users_registered() {
    metrics::counter!("apnifarm_users_registered_total").increment(1);
    metrics::gauge!("apnifarm_users_total").increment(1.0);
}

pub fn increment_animals_created(species: &str) {
    metrics::counter!("apnifarm_animals_created_total", "species" => species.to_string())
        .increment(1);
    metrics::gauge!("apnifarm_animals_total").increment(1.0);
}

pub fn increment_milk_recorded(liters: f64) {
    metrics::counter!("apnifarm_milk_entries_recorded_total").increment(1);
    metrics::gauge!("apnifarm_milk_entries_total").increment(1.0);
    metrics::histogram!("apnifarm_milk_liters").record(liters);
}

pub fn increment_feeding_recorded() {
    metrics::counter!("apnifarm_feeding_records_recorded_total").increment(1);
    metrics::gauge!("apnifarm_feeding_records_total").increment(1.0);
}
