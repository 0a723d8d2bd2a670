pub mod conversion;
pub mod ledger;
pub mod performance;
pub mod rates;
pub mod settings;
pub mod valuation;
pub mod vault;
