pub mod api;
pub mod args;
pub mod bot;
pub mod commands;
mod config;
mod error;
pub mod expense;
pub mod ledger;

pub use api::Mode;
pub use config::Config;
pub use error::{Error, LedgerError, Result};
pub use expense::Expense;
