pub use super::audit_logs::Entity as AuditLogs;
pub use super::gasless_sponsorships::Entity as GaslessSponsorships;
pub use super::payment_transactions::Entity as PaymentTransactions;
pub use super::security_policies::Entity as SecurityPolicies;
pub use super::subscription_plans::Entity as SubscriptionPlans;
pub use super::tokens::Entity as Tokens;
pub use super::transactions::Entity as Transactions;
pub use super::user_subscriptions::Entity as UserSubscriptions;
pub use super::users::Entity as Users;
