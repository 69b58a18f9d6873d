use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Assets {
    Table,
    Id,
    OwnerKind,
    OwnerId,
    Country,
    Name,
    Kind,
    Currency,
    BalanceMinor,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assets::OwnerKind).string().not_null())
                    .col(ColumnDef::new(Assets::OwnerId).string().not_null())
                    .col(ColumnDef::new(Assets::Country).string().not_null())
                    .col(ColumnDef::new(Assets::Name).string().not_null())
                    .col(ColumnDef::new(Assets::Kind).string().not_null())
                    .col(ColumnDef::new(Assets::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Assets::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assets::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assets_owner")
                    .table(Assets::Table)
                    .col(Assets::OwnerKind)
                    .col(Assets::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await
    }
}
