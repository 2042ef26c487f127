//! Authentication types shared by Botaskaf binaries.
//!
//! Sessions are terminated by the fronting gateway, which forwards the
//! authenticated account as `x-botaskaf-user-id`.

pub mod identity;
pub mod password;
