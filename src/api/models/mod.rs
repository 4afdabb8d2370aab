//! API request/response models.

pub mod auth;
pub mod blocks;
pub mod images;
pub mod pages;
pub mod projects;
pub mod settings;
