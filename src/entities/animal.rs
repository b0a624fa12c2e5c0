use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "animals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub farm_id: i32,
    // Local visual tag, unique per farm (enforced by index).
    pub tag_id: String,
    // Global asset id, format PK-{SPECIES_CODE}-{YEAR}-{RAND4}.
    #[sea_orm(unique)]
    pub sra_id: String,
    pub species: String,
    pub breed: Option<String>,
    pub gender: String,
    pub dob: Option<Date>,
    pub status: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FarmId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::milk_record::Entity")]
    MilkRecord,
    #[sea_orm(has_many = "super::feeding_record::Entity")]
    FeedingRecord,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::milk_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MilkRecord.def()
    }
}

impl Related<super::feeding_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeedingRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
