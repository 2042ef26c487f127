pub mod repository;
pub mod settings;
pub mod types;
