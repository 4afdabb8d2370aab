pub mod blocks;
pub mod pages;
pub mod projects;
pub mod sessions;
pub mod settings;
