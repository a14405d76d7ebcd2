pub mod credential_repo;
pub mod ledger_repo;
pub mod notification_repo;
pub mod record_repo;
pub mod subscription_repo;
