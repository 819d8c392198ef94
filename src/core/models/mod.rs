pub mod audit;
pub mod currency;
pub mod ledger;
pub mod reconciliation;
pub mod shared_account;
