//! sea-orm entities for the Botaskaf tables.

pub mod forms;
pub mod recipients;
pub mod users;
