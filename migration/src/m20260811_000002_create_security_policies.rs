use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SecurityPolicies::Table)
                    .if_not_exists()
                    .col(pk_auto(SecurityPolicies::Id))
                    .col(integer(SecurityPolicies::UserId).not_null())
                    .col(string(SecurityPolicies::PolicyType).not_null())
                    .col(json(SecurityPolicies::Config).not_null())
                    .col(boolean(SecurityPolicies::Active).default(true))
                    .col(timestamp_with_time_zone(SecurityPolicies::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(SecurityPolicies::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_security_policies_user_active")
                    .table(SecurityPolicies::Table)
                    .col(SecurityPolicies::UserId)
                    .col(SecurityPolicies::Active)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SecurityPolicies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SecurityPolicies {
    Table,
    Id,
    UserId,
    PolicyType,
    Config,
    Active,
    CreatedAt,
    UpdatedAt,
}
