//! Test utilities for Botaskaf services. Dev-dependency only.

pub mod auth;
