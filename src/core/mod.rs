//! Core domain types and the abstractions at I/O seams

pub mod cache;
pub mod config;
pub mod currency;
pub mod expense;
pub mod log;
pub mod money;
pub mod month;

// Re-export main types for cleaner imports
pub use cache::KeyValueCollection;
pub use currency::{BASE_CURRENCY, Currency, RateFeed, RateQuote};
pub use expense::{Category, ExpenseChanges, ExpenseRecord, NewExpense};
pub use month::{DateRange, YearMonth};
