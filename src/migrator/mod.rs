use sea_orm_migration::prelude::*;

mod m20260802_000001_create_users_and_animals;
mod m20260802_000002_create_milk_entries;
mod m20260811_000001_create_feeding_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260802_000001_create_users_and_animals::Migration),
            Box::new(m20260802_000002_create_milk_entries::Migration),
            Box::new(m20260811_000001_create_feeding_records::Migration),
        ]
    }
}
