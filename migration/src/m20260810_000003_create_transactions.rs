use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(integer(Transactions::TokenId).not_null())
                    .col(integer(Transactions::UserId).not_null())
                    .col(string(Transactions::TxType).not_null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .decimal_len(38, 12)
                            .not_null(),
                    )
                    .col(string(Transactions::Status).default("pending"))
                    .col(string_null(Transactions::OriginHash))
                    .col(json_null(Transactions::Metadata))
                    .col(timestamp_with_time_zone(Transactions::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Transactions::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_user_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_token_id")
                    .table(Transactions::Table)
                    .col(Transactions::TokenId)
                    .to_owned(),
            )
            .await?;

        // Rate-limit windows query by user + type + created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_user_type_created")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::TxType)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TokenId,
    UserId,
    TxType,
    Amount,
    Status,
    OriginHash,
    Metadata,
    CreatedAt,
    UpdatedAt,
}
