//! Create `entry` table with FK to `app_user`.
//!
//! One row per customer/lead. Deleting a user removes the entries they own.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Entry::Table)
                    .if_not_exists()
                    .col(uuid(Entry::Id).primary_key())
                    .col(string_len(Entry::CustomerName, 100).not_null())
                    .col(string_len(Entry::MobileNumber, 10).not_null())
                    .col(string_len(Entry::Address, 200).not_null())
                    .col(string_len(Entry::Organization, 100).not_null())
                    .col(string_len(Entry::Products, 100).not_null())
                    .col(string_len(Entry::Type, 16).not_null())
                    .col(string_len(Entry::Category, 16).not_null())
                    .col(string_len(Entry::City, 50).not_null())
                    .col(string_len(Entry::State, 50).not_null())
                    .col(string_len(Entry::Status, 32).not_null())
                    .col(
                        ColumnDef::new(Entry::ExpectedClosingDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Entry::FollowUpDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(string_len(Entry::Remarks, 500).not_null())
                    .col(uuid(Entry::CreatedBy).not_null())
                    .col(timestamp_with_time_zone(Entry::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Entry::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entry_created_by")
                            .from(Entry::Table, Entry::CreatedBy)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Entry::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Entry {
    Table,
    Id,
    CustomerName,
    MobileNumber,
    Address,
    Organization,
    Products,
    Type,
    Category,
    City,
    State,
    Status,
    ExpectedClosingDate,
    FollowUpDate,
    Remarks,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AppUser { Table, Id }
