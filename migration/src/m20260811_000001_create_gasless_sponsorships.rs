//! Gasless sponsorship table. The unique (user_id, nonce) index is the
//! arbiter for nonce allocation: concurrent sponsors for the same user
//! collide here and the loser retries with a fresh max(nonce)+1.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GaslessSponsorships::Table)
                    .if_not_exists()
                    .col(pk_auto(GaslessSponsorships::Id))
                    .col(integer(GaslessSponsorships::TransactionId).not_null())
                    .col(integer(GaslessSponsorships::UserId).not_null())
                    .col(string(GaslessSponsorships::SponsorAddress).not_null())
                    .col(
                        ColumnDef::new(GaslessSponsorships::EstimatedFee)
                            .decimal_len(38, 12)
                            .not_null(),
                    )
                    .col(big_integer(GaslessSponsorships::Nonce).not_null())
                    .col(string(GaslessSponsorships::Status).default("pending"))
                    .col(timestamp_with_time_zone(GaslessSponsorships::ExpiresAt).not_null())
                    .col(
                        timestamp_with_time_zone(GaslessSponsorships::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(GaslessSponsorships::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One sponsorship per transaction
        manager
            .create_index(
                Index::create()
                    .name("idx_gasless_transaction_id")
                    .table(GaslessSponsorships::Table)
                    .col(GaslessSponsorships::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Nonce uniqueness per user
        manager
            .create_index(
                Index::create()
                    .name("idx_gasless_user_nonce")
                    .table(GaslessSponsorships::Table)
                    .col(GaslessSponsorships::UserId)
                    .col(GaslessSponsorships::Nonce)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gasless_user_created")
                    .table(GaslessSponsorships::Table)
                    .col(GaslessSponsorships::UserId)
                    .col(GaslessSponsorships::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GaslessSponsorships::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GaslessSponsorships {
    Table,
    Id,
    TransactionId,
    UserId,
    SponsorAddress,
    EstimatedFee,
    Nonce,
    Status,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}
