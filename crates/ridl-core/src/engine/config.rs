use crate::core::models::metrics::DensityMetric;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

const DEFAULT_LIGAND_RADIUS_ANGSTROMS: f64 = 4.0;

/// Configuration for assembling and post-processing one damage series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    /// Accumulated dose per higher-dose dataset, strictly increasing, in
    /// dataset order. May be empty, in which case regressions run against
    /// the 1-based dataset index instead.
    pub doses: Vec<f64>,
    /// Whether metrics that need calculated (FC) maps are carried through.
    pub include_density_weighted: bool,
    /// Source metric for the derived per-atom "average" value.
    pub average_metric: DensityMetric,
    /// Metrics for which Calpha-normalised variants are derived (when the
    /// structure contains Calpha atoms).
    pub normalised_metrics: Vec<DensityMetric>,
    /// Distance cutoff for classifying atoms as ligand-bound.
    pub ligand_radius_angstroms: f64,
}

impl SeriesConfig {
    /// The default Calpha-normalisation interest set, widened with the
    /// density-weighted pair when calculated-map metrics are enabled.
    pub fn default_normalised_metrics(include_density_weighted: bool) -> Vec<DensityMetric> {
        let mut metrics = vec![
            DensityMetric::Loss,
            DensityMetric::Mean,
            DensityMetric::Gain,
            DensityMetric::Bfactor,
        ];
        if include_density_weighted {
            metrics.push(DensityMetric::DensityWeightedMeanNegOnly);
            metrics.push(DensityMetric::DensityWeightedLoss);
        }
        metrics
    }
}

#[derive(Default)]
pub struct SeriesConfigBuilder {
    doses: Option<Vec<f64>>,
    include_density_weighted: Option<bool>,
    average_metric: Option<DensityMetric>,
    normalised_metrics: Option<Vec<DensityMetric>>,
    ligand_radius_angstroms: Option<f64>,
}

impl SeriesConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doses(mut self, doses: Vec<f64>) -> Self {
        self.doses = Some(doses);
        self
    }
    pub fn include_density_weighted(mut self, include: bool) -> Self {
        self.include_density_weighted = Some(include);
        self
    }
    pub fn average_metric(mut self, metric: DensityMetric) -> Self {
        self.average_metric = Some(metric);
        self
    }
    pub fn normalised_metrics(mut self, metrics: Vec<DensityMetric>) -> Self {
        self.normalised_metrics = Some(metrics);
        self
    }
    pub fn ligand_radius_angstroms(mut self, radius: f64) -> Self {
        self.ligand_radius_angstroms = Some(radius);
        self
    }

    pub fn build(self) -> Result<SeriesConfig, ConfigError> {
        let doses = self.doses.ok_or(ConfigError::MissingParameter("doses"))?;
        let include_density_weighted = self
            .include_density_weighted
            .ok_or(ConfigError::MissingParameter("include_density_weighted"))?;

        let ligand_radius_angstroms = self
            .ligand_radius_angstroms
            .unwrap_or(DEFAULT_LIGAND_RADIUS_ANGSTROMS);
        if !ligand_radius_angstroms.is_finite() || ligand_radius_angstroms < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "ligand_radius_angstroms",
                reason: format!("must be a non-negative number, got {}", ligand_radius_angstroms),
            });
        }

        Ok(SeriesConfig {
            doses,
            include_density_weighted,
            average_metric: self.average_metric.unwrap_or(DensityMetric::Loss),
            normalised_metrics: self.normalised_metrics.unwrap_or_else(|| {
                SeriesConfig::default_normalised_metrics(include_density_weighted)
            }),
            ligand_radius_angstroms,
        })
    }
}
