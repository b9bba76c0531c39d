use crate::config::models::AppConfig;
use crate::error::{CliError, Result};
use ridlpp::core::models::metrics::DensityMetric;
use ridlpp::engine::config::SeriesConfigBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSeriesConfig {
    #[serde(rename = "series-name")]
    pub series_name: String,
    #[serde(rename = "initial-pdb")]
    pub initial_pdb: PathBuf,
    /// Per-dataset metric tables, ordered by increasing dose.
    pub datasets: Vec<PathBuf>,
    /// Accumulated dose per dataset; may be omitted to regress against
    /// dataset index.
    #[serde(default)]
    pub doses: Vec<f64>,
    #[serde(rename = "include-density-weighted", default)]
    pub include_density_weighted: bool,
    #[serde(rename = "ligand-radius")]
    pub ligand_radius: Option<f64>,
    #[serde(rename = "average-metric")]
    pub average_metric: Option<String>,
    #[serde(rename = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

/// Loads and validates the series configuration file, resolving relative
/// paths against the file's own directory.
pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let file_config: FileSeriesConfig =
        toml::from_str(&text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
    debug!("Parsed series configuration: {:?}", &file_config);

    let base_dir = path.parent().unwrap_or(Path::new("."));
    build_app_config(file_config, base_dir)
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn build_app_config(file_config: FileSeriesConfig, base_dir: &Path) -> Result<AppConfig> {
    if file_config.datasets.is_empty() {
        return Err(CliError::Config(
            "'datasets' must list at least one per-dataset metric table".to_string(),
        ));
    }
    if !file_config.doses.is_empty() && file_config.doses.len() != file_config.datasets.len() {
        return Err(CliError::Config(format!(
            "'doses' lists {} values but 'datasets' lists {} tables",
            file_config.doses.len(),
            file_config.datasets.len()
        )));
    }

    let mut builder = SeriesConfigBuilder::new()
        .doses(file_config.doses)
        .include_density_weighted(file_config.include_density_weighted);
    if let Some(radius) = file_config.ligand_radius {
        builder = builder.ligand_radius_angstroms(radius);
    }
    if let Some(name) = &file_config.average_metric {
        let metric: DensityMetric = name
            .parse()
            .map_err(|e| CliError::Config(format!("'average-metric': {}", e)))?;
        builder = builder.average_metric(metric);
    }
    let core_config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        series_name: file_config.series_name,
        initial_pdb: resolve(base_dir, file_config.initial_pdb),
        dataset_paths: file_config
            .datasets
            .into_iter()
            .map(|p| resolve(base_dir, p))
            .collect(),
        output_dir: resolve(
            base_dir,
            file_config.output_dir.unwrap_or_else(|| PathBuf::from(".")),
        ),
        core_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    const VALID_CONFIG: &str = r#"
series-name = "insulin-burn"
initial-pdb = "data/insulin1.pdb"
datasets = ["data/d2.csv", "data/d3.csv"]
doses = [3.1, 6.2]
include-density-weighted = true
ligand-radius = 5.0
output-dir = "out"
"#;

    #[test]
    fn valid_config_loads_and_resolves_paths() {
        let (dir, path) = write_config(VALID_CONFIG);
        let config = load_app_config(&path).unwrap();

        assert_eq!(config.series_name, "insulin-burn");
        assert_eq!(config.initial_pdb, dir.path().join("data/insulin1.pdb"));
        assert_eq!(config.dataset_paths.len(), 2);
        assert_eq!(config.dataset_paths[1], dir.path().join("data/d3.csv"));
        assert_eq!(config.output_dir, dir.path().join("out"));
        assert_eq!(config.core_config.doses, vec![3.1, 6.2]);
        assert!(config.core_config.include_density_weighted);
        assert_eq!(config.core_config.ligand_radius_angstroms, 5.0);
    }

    #[test]
    fn omitted_optional_keys_take_defaults() {
        let (_dir, path) = write_config(
            r#"
series-name = "s"
initial-pdb = "m.pdb"
datasets = ["d2.csv"]
"#,
        );
        let config = load_app_config(&path).unwrap();
        assert!(config.core_config.doses.is_empty());
        assert!(!config.core_config.include_density_weighted);
        assert_eq!(config.core_config.average_metric, DensityMetric::Loss);
    }

    #[test]
    fn empty_dataset_list_is_a_config_error() {
        let (_dir, path) = write_config(
            r#"
series-name = "s"
initial-pdb = "m.pdb"
datasets = []
"#,
        );
        let err = load_app_config(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn dose_dataset_arity_mismatch_is_a_config_error() {
        let (_dir, path) = write_config(
            r#"
series-name = "s"
initial-pdb = "m.pdb"
datasets = ["d2.csv"]
doses = [1.0, 2.0]
"#,
        );
        let err = load_app_config(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, path) = write_config(
            r#"
series-name = "s"
initial-pdb = "m.pdb"
datasets = ["d2.csv"]
plot-heatmaps = true
"#,
        );
        let err = load_app_config(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn bad_average_metric_name_is_a_config_error() {
        let (_dir, path) = write_config(
            r#"
series-name = "s"
initial-pdb = "m.pdb"
datasets = ["d2.csv"]
average-metric = "wibble"
"#,
        );
        let err = load_app_config(&path).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn missing_file_is_a_file_parsing_error() {
        let err = load_app_config(Path::new("/nonexistent/series.toml")).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }
}
