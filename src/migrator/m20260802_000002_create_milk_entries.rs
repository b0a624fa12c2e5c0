use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MilkEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MilkEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MilkEntries::AnimalId).integer().not_null())
                    .col(ColumnDef::new(MilkEntries::Liters).double().not_null())
                    .col(ColumnDef::new(MilkEntries::Date).date().not_null())
                    .col(ColumnDef::new(MilkEntries::Session).string_len(10).null())
                    .col(ColumnDef::new(MilkEntries::FatPercentage).double().null())
                    .col(ColumnDef::new(MilkEntries::RecordedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-milk_entry-animal_id")
                            .from(MilkEntries::Table, MilkEntries::AnimalId)
                            .to(Animals::Table, Animals::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing and stats both filter by date.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-milk_entries-date")
                    .table(MilkEntries::Table)
                    .col(MilkEntries::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MilkEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MilkEntries {
    Table,
    Id,
    AnimalId,
    Liters,
    Date,
    Session,
    FatPercentage,
    RecordedAt,
}

#[derive(DeriveIden)]
enum Animals {
    Table,
    Id,
}
