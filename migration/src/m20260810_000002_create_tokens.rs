use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tokens::Table)
                    .if_not_exists()
                    .col(pk_auto(Tokens::Id))
                    .col(integer(Tokens::OwnerId).not_null())
                    .col(string(Tokens::Name).not_null())
                    .col(string_len(Tokens::Symbol, 12).not_null())
                    .col(string_null(Tokens::PolicyId))
                    .col(small_integer(Tokens::Decimals).default(6))
                    .col(
                        ColumnDef::new(Tokens::TotalSupply)
                            .decimal_len(38, 12)
                            .not_null()
                            .default(0),
                    )
                    .col(timestamp_with_time_zone(Tokens::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Tokens::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tokens_owner_id")
                    .table(Tokens::Table)
                    .col(Tokens::OwnerId)
                    .to_owned(),
            )
            .await?;

        // One symbol per owner
        manager
            .create_index(
                Index::create()
                    .name("idx_tokens_owner_symbol")
                    .table(Tokens::Table)
                    .col(Tokens::OwnerId)
                    .col(Tokens::Symbol)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tokens {
    Table,
    Id,
    OwnerId,
    Name,
    Symbol,
    PolicyId,
    Decimals,
    TotalSupply,
    CreatedAt,
    UpdatedAt,
}
