use crate::core::models::atom::StructureAtom;
use crate::core::models::dataset::DatasetMetricTable;
use crate::engine::combine::DoseSeries;
use crate::engine::config::SeriesConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// The in-memory inputs of the post-processing stage: the initial-structure
/// atom list and one metric table per higher-dose dataset, in dose order.
#[derive(Debug, Clone)]
pub struct SeriesInput {
    pub initial_atoms: Vec<StructureAtom>,
    pub datasets: Vec<DatasetMetricTable>,
}

/// Assembles the combined damage series for one dose series.
///
/// Merges the per-dataset tables into a [`DoseSeries`], derives the
/// per-atom "average" value for the configured source metric, and derives
/// Calpha-normalised variants for the configured interest set when the
/// structure contains Calpha atoms. The returned series is ready for
/// ranking via [`crate::engine::ranking`].
#[instrument(skip_all, name = "series_workflow")]
pub fn run(
    input: &SeriesInput,
    config: &SeriesConfig,
    reporter: &ProgressReporter,
) -> Result<DoseSeries, EngineError> {
    // === Phase 1: Cross-dataset identity-matched merge ===
    reporter.report(Progress::PhaseStart {
        name: "Combining datasets",
    });
    info!(
        datasets = input.datasets.len(),
        initial_atoms = input.initial_atoms.len(),
        "Combining per-dataset metric tables into a damage series."
    );
    let mut series = DoseSeries::combine(&input.initial_atoms, &input.datasets, config)?;
    reporter.report(Progress::Message(format!(
        "{} of {} atoms matched across all {} datasets",
        series.len(),
        input.initial_atoms.len(),
        input.datasets.len()
    )));
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Derived and normalised metrics ===
    reporter.report(Progress::PhaseStart {
        name: "Deriving metrics",
    });
    series.derive_average(config.average_metric);

    if series.has_calpha() {
        let normalised = series.derive_calpha_normalised(&config.normalised_metrics);
        reporter.report(Progress::Message(format!(
            "Calpha-normalised series derived for {} atoms",
            normalised
        )));
    } else {
        info!("No Calpha atoms in structure; normalised metrics not derived.");
        reporter.report(Progress::Message(
            "No Calpha atoms; normalised metrics skipped".to_string(),
        ));
    }
    reporter.report(Progress::PhaseFinish);

    info!(atoms = series.len(), "Damage series workflow complete.");
    Ok(series)
}
