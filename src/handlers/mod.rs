pub mod auth;
pub mod materials;
pub mod requests;
pub mod stock_entries;
