use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserSubscriptions::Table)
                    .if_not_exists()
                    .col(pk_auto(UserSubscriptions::Id))
                    .col(integer(UserSubscriptions::UserId).not_null())
                    .col(integer_null(UserSubscriptions::PlanId))
                    .col(string(UserSubscriptions::ExternalId).not_null().unique_key())
                    .col(string(UserSubscriptions::Status).default("active"))
                    .col(timestamp_with_time_zone_null(UserSubscriptions::CurrentPeriodEnd))
                    .col(
                        timestamp_with_time_zone(UserSubscriptions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(UserSubscriptions::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_subscriptions_user_id")
                    .table(UserSubscriptions::Table)
                    .col(UserSubscriptions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserSubscriptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserSubscriptions {
    Table,
    Id,
    UserId,
    PlanId,
    ExternalId,
    Status,
    CurrentPeriodEnd,
    CreatedAt,
    UpdatedAt,
}
