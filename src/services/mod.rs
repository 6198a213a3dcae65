pub mod auth;
pub mod material_service;
pub mod request_service;
