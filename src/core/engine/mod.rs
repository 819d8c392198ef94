//! Pure computations behind reconciliation and shared-account settlement.
//! Nothing in here touches storage.

pub mod ledger_balance;
pub mod matcher;
pub mod settlement;
pub mod split;
