use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FeedingRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeedingRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeedingRecords::AnimalId).integer().not_null())
                    .col(ColumnDef::new(FeedingRecords::FeedType).string_len(50).not_null())
                    .col(ColumnDef::new(FeedingRecords::QuantityKg).double().not_null())
                    .col(ColumnDef::new(FeedingRecords::Notes).text().null())
                    .col(ColumnDef::new(FeedingRecords::RecordedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-feeding_record-animal_id")
                            .from(FeedingRecords::Table, FeedingRecords::AnimalId)
                            .to(Animals::Table, Animals::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FeedingRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FeedingRecords {
    Table,
    Id,
    AnimalId,
    FeedType,
    QuantityKg,
    Notes,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Animals {
    Table,
    Id,
}
