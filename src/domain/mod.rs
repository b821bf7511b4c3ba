pub mod account;
pub mod account_repository;
pub mod bundle;
pub mod trial_policy;
