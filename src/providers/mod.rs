pub mod frankfurter;
pub mod open_er_api;

pub use frankfurter::FrankfurterFeed;
pub use open_er_api::OpenErApiFeed;
