pub mod sqlite_account_repo;
pub mod telegram;
