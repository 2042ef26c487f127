pub mod cache;
pub mod form;
pub mod recipient;
pub mod token;
pub mod user;
