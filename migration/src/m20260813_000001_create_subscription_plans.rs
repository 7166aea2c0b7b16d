use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SubscriptionPlans::Table)
                    .if_not_exists()
                    .col(pk_auto(SubscriptionPlans::Id))
                    .col(string(SubscriptionPlans::ExternalId).not_null().unique_key())
                    .col(string(SubscriptionPlans::Name).not_null())
                    .col(integer(SubscriptionPlans::PriceCents).not_null())
                    .col(string_len(SubscriptionPlans::Currency, 8).default("usd"))
                    .col(string(SubscriptionPlans::Interval).default("month"))
                    .col(boolean(SubscriptionPlans::Active).default(true))
                    .col(
                        timestamp_with_time_zone(SubscriptionPlans::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubscriptionPlans::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SubscriptionPlans {
    Table,
    Id,
    ExternalId,
    Name,
    PriceCents,
    Currency,
    Interval,
    Active,
    CreatedAt,
}
