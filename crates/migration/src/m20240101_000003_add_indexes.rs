use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Entry: scope filter for non-admin list/export
        manager
            .create_index(
                Index::create()
                    .name("idx_entry_created_by")
                    .table(Entry::Table)
                    .col(Entry::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entry_created_at")
                    .table(Entry::Table)
                    .col(Entry::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_entry_created_by").table(Entry::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_entry_created_at").table(Entry::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Entry { Table, CreatedBy, CreatedAt }
