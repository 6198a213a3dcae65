pub mod user_repo;
pub use user_repo::UserRepository;
pub mod material_repo;
pub use material_repo::MaterialRepository;
pub mod request_repo;
pub use request_repo::RequestRepository;
pub mod stock_entry_repo;
pub use stock_entry_repo::StockEntryRepository;
