pub mod compare;
pub mod rank;

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use ridlpp::core::io::{pdb, table};
use ridlpp::core::models::metrics::{DensityMetric, MetricVariant};
use ridlpp::engine::combine::DoseSeries;
use ridlpp::engine::progress::ProgressReporter;
use ridlpp::engine::ranking::RankSelection;
use ridlpp::workflows::series::{self, SeriesInput};
use tracing::info;

/// Reads the external inputs named by the configuration and runs the series
/// workflow, rendering progress on stderr.
pub(crate) fn assemble_series(app_config: &AppConfig) -> Result<DoseSeries> {
    info!(
        "Reading initial structure: {}",
        app_config.initial_pdb.display()
    );
    let initial_atoms =
        pdb::load_structure(&app_config.initial_pdb).map_err(|e| CliError::FileParsing {
            path: app_config.initial_pdb.clone(),
            source: e.into(),
        })?;

    let mut datasets = Vec::with_capacity(app_config.dataset_paths.len());
    for path in &app_config.dataset_paths {
        info!("Reading dataset metric table: {}", path.display());
        let table = table::load_metric_table(path).map_err(|e| CliError::FileParsing {
            path: path.clone(),
            source: e.into(),
        })?;
        datasets.push(table);
    }

    let progress = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let series = series::run(
        &SeriesInput {
            initial_atoms,
            datasets,
        },
        &app_config.core_config,
        &reporter,
    )?;
    Ok(series)
}

pub(crate) fn parse_selection(metric: &str, normalised: bool) -> Result<RankSelection> {
    let metric: DensityMetric = metric
        .parse()
        .map_err(|e: ridlpp::core::models::metrics::ParseMetricError| {
            CliError::Argument(e.to_string())
        })?;
    Ok(RankSelection {
        metric,
        variant: MetricVariant::from_normalised(normalised),
    })
}

pub(crate) fn variant_slug(variant: MetricVariant) -> &'static str {
    match variant {
        MetricVariant::Standard => "standard",
        MetricVariant::CalphaNormalised => "normalised",
    }
}
