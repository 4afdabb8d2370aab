//! Data access layer: error categorization, row models, and per-table repositories.

pub mod errors;
pub mod handlers;
pub mod models;
