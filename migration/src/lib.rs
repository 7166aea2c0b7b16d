pub use sea_orm_migration::prelude::*;

mod m20260810_000001_create_users;
mod m20260810_000002_create_tokens;
mod m20260810_000003_create_transactions;
mod m20260811_000001_create_gasless_sponsorships;
mod m20260811_000002_create_security_policies;
mod m20260812_000001_create_audit_logs;
mod m20260813_000001_create_subscription_plans;
mod m20260813_000002_create_user_subscriptions;
mod m20260813_000003_create_payment_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260810_000001_create_users::Migration),
            Box::new(m20260810_000002_create_tokens::Migration),
            Box::new(m20260810_000003_create_transactions::Migration),
            Box::new(m20260811_000001_create_gasless_sponsorships::Migration),
            Box::new(m20260811_000002_create_security_policies::Migration),
            Box::new(m20260812_000001_create_audit_logs::Migration),
            Box::new(m20260813_000001_create_subscription_plans::Migration),
            Box::new(m20260813_000002_create_user_subscriptions::Migration),
            Box::new(m20260813_000003_create_payment_transactions::Migration),
        ]
    }
}
