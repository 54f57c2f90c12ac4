pub mod app;
pub mod auth;
pub mod customers;
pub mod invoices;
pub mod metrics;
