mod blocks;
mod pages;
mod projects;
mod repository;
mod sessions;
mod settings;

pub use blocks::Blocks;
pub use pages::Pages;
pub use projects::Projects;
pub use repository::Repository;
pub use sessions::{Sessions, SESSION_TTL_DAYS};
pub use settings::Settings;
