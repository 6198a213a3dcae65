pub mod auth;
pub mod material;
pub mod request;
pub mod stock_entry;
