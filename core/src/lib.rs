pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod rollover;

pub use db::Database;
pub use error::LedgerError;
pub use ledger::Ledger;
