use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentTransactions::Table)
                    .if_not_exists()
                    .col(pk_auto(PaymentTransactions::Id))
                    .col(integer_null(PaymentTransactions::UserId))
                    .col(string(PaymentTransactions::ExternalId).not_null().unique_key())
                    .col(integer(PaymentTransactions::AmountCents).not_null())
                    .col(string_len(PaymentTransactions::Currency, 8).default("usd"))
                    .col(string(PaymentTransactions::Status).default("pending"))
                    .col(
                        timestamp_with_time_zone(PaymentTransactions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(PaymentTransactions::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_transactions_user_id")
                    .table(PaymentTransactions::Table)
                    .col(PaymentTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentTransactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PaymentTransactions {
    Table,
    Id,
    UserId,
    ExternalId,
    AmountCents,
    Currency,
    Status,
    CreatedAt,
    UpdatedAt,
}
