//! Domain vocabulary shared across Botaskaf crates.
//!
//! Pure types only: no database, HTTP or cache dependencies.

pub mod id;
pub mod user;
