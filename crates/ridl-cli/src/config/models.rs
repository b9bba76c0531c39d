use ridlpp::engine::config as core_config;
use std::path::PathBuf;

#[derive(Debug)]
pub struct AppConfig {
    pub series_name: String,
    pub initial_pdb: PathBuf,
    pub dataset_paths: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub core_config: core_config::SeriesConfig,
}
