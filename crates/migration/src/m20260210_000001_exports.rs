use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Exports {
    Table,
    Id,
    UserId,
    Token,
    Filename,
    Period,
    Content,
    CreatedAt,
    ExpiresAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Exports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Exports::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Exports::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Exports::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Exports::Filename).string().not_null())
                    .col(ColumnDef::new(Exports::Period).string().not_null())
                    .col(ColumnDef::new(Exports::Content).blob().not_null())
                    .col(ColumnDef::new(Exports::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Exports::ExpiresAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Exports::Table).to_owned())
            .await
    }
}
