mod file;
mod models;

pub use file::load_app_config;
pub use models::AppConfig;
