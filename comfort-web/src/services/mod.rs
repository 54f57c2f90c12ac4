//! Application services for comfort-web.

pub mod database;
pub mod metrics;

pub use database::Database;
