use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Users Table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::FirebaseUid)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::PhoneNumber)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().null())
                    .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                    .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Create Animals Table
        manager
            .create_table(
                Table::create()
                    .table(Animals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Animals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Animals::FarmId).integer().not_null())
                    .col(ColumnDef::new(Animals::TagId).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Animals::SraId)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Animals::Species).string_len(20).not_null())
                    .col(ColumnDef::new(Animals::Breed).string_len(50).null())
                    .col(ColumnDef::new(Animals::Gender).string_len(10).not_null())
                    .col(ColumnDef::new(Animals::Dob).date().null())
                    .col(ColumnDef::new(Animals::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Animals::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-animal-farm_id")
                            .from(Animals::Table, Animals::FarmId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A visual tag must be unique within a farm, not globally.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-animals-farm-tag")
                    .table(Animals::Table)
                    .col(Animals::FarmId)
                    .col(Animals::TagId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Animals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    FirebaseUid,
    PhoneNumber,
    Name,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Animals {
    Table,
    Id,
    FarmId,
    TagId,
    SraId,
    Species,
    Breed,
    Gender,
    Dob,
    Status,
    CreatedAt,
}
