//! Terminal front end for each command

pub mod budget;
pub mod expenses;
pub mod export;
pub mod rates;
pub mod setup;
pub mod summary;
pub mod ui;
