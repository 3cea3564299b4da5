pub mod applications;
pub mod ledger;
pub mod marketplace;
pub mod matching;
pub mod search;
